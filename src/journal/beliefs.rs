use chrono::NaiveDate;
use serde::{
    de,
    Deserialize,
    Deserializer,
    Serialize,
};
use tracing::warn;

use super::{
    JournalStore,
    Keyed,
};
use crate::{
    core::{
        utils::{
            blank_fields,
            today,
        },
        LearnError,
        Notice,
    },
    persistence::LocalStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    pub affirmation: String,
    #[serde(alias = "pastExperience")]
    pub experience: String,
    pub expectation: String,
}

/// Older entries carry dates like "Mon May 20 2024".
const LEGACY_DAY_FORMAT: &str = "%a %b %d %Y";

fn deserialize_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let text = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&text, LEGACY_DAY_FORMAT))
        .map_err(de::Error::custom)
}

impl JournalEntry {
    pub fn blank(date: NaiveDate) -> Self {
        Self {
            date,
            affirmation: String::new(),
            experience: String::new(),
            expectation: String::new(),
        }
    }
}

impl Keyed for JournalEntry {
    type Key = NaiveDate;

    fn natural_key(&self) -> NaiveDate {
        self.date
    }
}

/// Daily beliefs form. The draft lives here, not in storage, so a failed
/// save leaves every answer in place for another try.
#[derive(Debug, Clone)]
pub struct BeliefsJournal {
    date: NaiveDate,
    pub affirmation: String,
    pub experience: String,
    pub expectation: String,
    saved_today: bool,
}

impl BeliefsJournal {
    /// Opens the form for `date`, prefilled from that day's entry if any.
    /// A failed load starts from a blank form.
    pub async fn open<S: LocalStore>(journal: &JournalStore<S>, date: NaiveDate) -> Self {
        let entry = match journal.find_or_create_entry_for_date(date).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error loading journal entries: {}", e);
                JournalEntry::blank(date)
            }
        };

        let saved_today = !entry.affirmation.is_empty()
            || !entry.experience.is_empty()
            || !entry.expectation.is_empty();

        Self {
            date,
            affirmation: entry.affirmation,
            experience: entry.experience,
            expectation: entry.expectation,
            saved_today,
        }
    }

    pub async fn open_today<S: LocalStore>(journal: &JournalStore<S>) -> Self {
        Self::open(journal, today()).await
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn has_entry_for_day(&self) -> bool {
        self.saved_today
    }

    pub fn draft(&self) -> JournalEntry {
        JournalEntry {
            date: self.date,
            affirmation: self.affirmation.trim().to_string(),
            experience: self.experience.trim().to_string(),
            expectation: self.expectation.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<JournalEntry, LearnError> {
        let missing = blank_fields(&[
            ("affirmation", self.affirmation.as_str()),
            ("experience", self.experience.as_str()),
            ("expectation", self.expectation.as_str()),
        ]);
        if missing.is_empty() {
            Ok(self.draft())
        } else {
            Err(LearnError::MissingFields(missing.into_iter().map(String::from).collect()))
        }
    }

    /// Validates then upserts the day's entry. Either way the draft is kept.
    pub async fn save<S: LocalStore>(&mut self, journal: &JournalStore<S>) -> Result<Notice, Notice> {
        let entry = self.validate().map_err(|e| Notice::from(&e))?;

        match journal.upsert_entry(entry).await {
            Ok(_) => {
                self.saved_today = true;
                Ok(Notice::info("Saved", "Entry saved successfully!"))
            }
            Err(e) => {
                warn!(date = %self.date, "Error saving entry: {}", e);
                Err(Notice::from(&LearnError::persistence("journal entry", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        core::NoticeKind,
        persistence::MemoryStore,
    };

    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl LocalStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, LearnError> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), LearnError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        async fn remove(&self, _key: &str) -> Result<(), LearnError> {
            Ok(())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    #[test]
    fn test_legacy_field_name_is_accepted() {
        let json = r#"{"date":"2024-05-20","affirmation":"a","pastExperience":"b","expectation":"c"}"#;
        let entry: JournalEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.experience, "b");
    }

    #[tokio::test]
    async fn test_entries_with_long_form_dates_are_upserted_by_day() {
        let store = MemoryStore::new();
        store
            .set(
                crate::journal::BELIEFS_JOURNAL_KEY,
                r#"[{"date":"Mon May 20 2024","affirmation":"a","experience":"b","expectation":"c"}]"#
                    .to_string(),
            )
            .await
            .unwrap();
        let journal = JournalStore::new(store);

        let mut form = BeliefsJournal::open(&journal, day()).await;
        assert!(form.has_entry_for_day());
        assert_eq!(form.affirmation, "a");

        form.expectation = "c, but better".to_string();
        form.save(&journal).await.unwrap();
        let entries = journal.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].expectation, "c, but better");

        let bad: Result<JournalEntry, _> = serde_json::from_str(
            r#"{"date":"someday","affirmation":"a","experience":"b","expectation":"c"}"#,
        );
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_save_requires_all_fields() {
        let journal = JournalStore::new(MemoryStore::new());
        let mut form = BeliefsJournal::open(&journal, day()).await;
        assert!(!form.has_entry_for_day());

        form.affirmation = "I am capable of learning".to_string();
        form.expectation = "  ".to_string();
        let notice = form.save(&journal).await.unwrap_err();
        assert_eq!(notice.kind, NoticeKind::Validation);
        assert!(notice.message.contains("experience"));
        assert!(journal.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_reopen_prefills() {
        let journal = JournalStore::new(MemoryStore::new());
        let mut form = BeliefsJournal::open(&journal, day()).await;
        form.affirmation = " I am capable ".to_string();
        form.experience = "I finished my project".to_string();
        form.expectation = "I will ace the quiz".to_string();
        assert!(form.save(&journal).await.is_ok());
        assert!(form.has_entry_for_day());

        let reopened = BeliefsJournal::open(&journal, day()).await;
        assert!(reopened.has_entry_for_day());
        assert_eq!(reopened.affirmation, "I am capable");

        let mut again = reopened.clone();
        again.expectation = "I will ace the test".to_string();
        again.save(&journal).await.unwrap();
        let entries = journal.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].expectation, "I will ace the test");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft() {
        let journal = JournalStore::new(ReadOnlyStore(MemoryStore::new()));
        let mut form = BeliefsJournal::open(&journal, day()).await;
        form.affirmation = "I am capable".to_string();
        form.experience = "I read a chapter".to_string();
        form.expectation = "I will read another".to_string();

        let notice = form.save(&journal).await.unwrap_err();
        assert_eq!(notice.kind, NoticeKind::Persistence);
        assert_eq!(form.affirmation, "I am capable");
        assert_eq!(form.experience, "I read a chapter");
        assert!(!form.has_entry_for_day());
    }
}
