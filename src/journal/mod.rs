use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::{
    core::LearnError,
    persistence::{
        load_collection,
        load_document,
        save_collection,
        save_document,
        LocalStore,
    },
    wizard::Goal,
};

pub mod beliefs;
pub mod homework;

pub use beliefs::{
    BeliefsJournal,
    JournalEntry,
};
pub use homework::{
    HomeworkDiary,
    TaskCategory,
    TaskDetails,
    TaskItem,
};

pub const BELIEFS_JOURNAL_KEY: &str = "beliefs_journal";
pub const SAVED_GOALS_KEY: &str = "saved_goals";
pub const HOMEWORK_DIARY_KEY: &str = "homework_diary";
/// Section-keyed diary written by earlier releases. Read once, never written.
pub const LEGACY_HOMEWORK_DIARY_KEY: &str = "homeworkDiaryTasks";

/// The field(s) that make two records "the same" for upsert purposes.
pub trait Keyed {
    type Key: PartialEq;

    fn natural_key(&self) -> Self::Key;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Replaced(usize),
    Appended(usize),
}

/// Replaces the item sharing `item`'s natural key in place, or appends it.
pub fn upsert<T: Keyed>(items: &mut Vec<T>, item: T) -> Upserted {
    let key = item.natural_key();
    match items.iter().position(|existing| existing.natural_key() == key) {
        Some(index) => {
            items[index] = item;
            Upserted::Replaced(index)
        }
        None => {
            items.push(item);
            Upserted::Appended(items.len() - 1)
        }
    }
}

pub struct JournalStore<S: LocalStore> {
    store: S,
}

impl<S: LocalStore> JournalStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every entry, oldest day first.
    pub async fn entries(&self) -> Result<Vec<JournalEntry>, LearnError> {
        let mut entries: Vec<JournalEntry> = load_collection(&self.store, BELIEFS_JOURNAL_KEY).await?;
        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }

    /// The stored entry for `date`, or a blank unsaved one.
    pub async fn find_or_create_entry_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<JournalEntry, LearnError> {
        let entries: Vec<JournalEntry> = load_collection(&self.store, BELIEFS_JOURNAL_KEY).await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.date == date)
            .unwrap_or_else(|| JournalEntry::blank(date)))
    }

    pub async fn upsert_entry(&self, entry: JournalEntry) -> Result<Upserted, LearnError> {
        let mut entries: Vec<JournalEntry> =
            load_collection(&self.store, BELIEFS_JOURNAL_KEY).await?;
        let date = entry.date;
        let outcome = upsert(&mut entries, entry);
        save_collection(&self.store, BELIEFS_JOURNAL_KEY, &entries).await?;
        info!(%date, ?outcome, "journal entry saved");
        Ok(outcome)
    }

    /// Saved goals, oldest first.
    pub async fn goals(&self) -> Result<Vec<Goal>, LearnError> {
        let mut goals: Vec<Goal> = load_collection(&self.store, SAVED_GOALS_KEY).await?;
        goals.sort_by_key(|goal| goal.created_at);
        Ok(goals)
    }

    pub async fn save_goal(&self, goal: Goal) -> Result<Upserted, LearnError> {
        let mut goals: Vec<Goal> = load_collection(&self.store, SAVED_GOALS_KEY).await?;
        let id = goal.id.clone();
        let outcome = upsert(&mut goals, goal);
        save_collection(&self.store, SAVED_GOALS_KEY, &goals).await?;
        info!(goal = %id, ?outcome, "goal saved");
        Ok(outcome)
    }

    pub async fn delete_goal(&self, id: &str) -> Result<bool, LearnError> {
        let mut goals: Vec<Goal> = load_collection(&self.store, SAVED_GOALS_KEY).await?;
        let before = goals.len();
        goals.retain(|goal| goal.id != id);
        if goals.len() == before {
            return Ok(false);
        }
        save_collection(&self.store, SAVED_GOALS_KEY, &goals).await?;
        Ok(true)
    }

    /// The diary, or a fresh one with one blank item per category. Falls back
    /// to the section-keyed layout when nothing was saved in the current one.
    pub async fn homework_diary(&self) -> Result<HomeworkDiary, LearnError> {
        let diary: Option<HomeworkDiary> = load_document(&self.store, HOMEWORK_DIARY_KEY).await?;
        if let Some(diary) = diary {
            return Ok(diary.normalized());
        }

        let sections: Option<BTreeMap<TaskCategory, Vec<Value>>> =
            load_document(&self.store, LEGACY_HOMEWORK_DIARY_KEY).await?;
        Ok(match sections {
            Some(sections) => {
                info!("homework diary read from the section-keyed layout");
                HomeworkDiary::from_sections(sections)
            }
            None => HomeworkDiary::default(),
        })
    }

    pub async fn save_homework_diary(&self, diary: &HomeworkDiary) -> Result<(), LearnError> {
        save_document(&self.store, HOMEWORK_DIARY_KEY, diary).await
    }
}
