//! Per-user vocabulary journal stored in the remote `vocab_words` table.

use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    core::{
        utils::{
            blank_fields,
            Blank,
        },
        LearnError,
    },
    remote::{
        select_as,
        Query,
        RemoteStore,
    },
};

pub const VOCAB_TABLE: &str = "vocab_words";

/// The eight understanding-strategy steps, keyed as stored in `strategy_data`.
pub const STRATEGY_STEPS: [(&str, &str); 8] = [
    ("identify", "Identify the tricky word/term/symbol"),
    ("context", "What does it mean in this context?"),
    ("example", "Create your own example"),
    ("picture", "Picture it in your mind"),
    ("sounds", "Add sounds to your example"),
    ("emotions", "Add strong emotions"),
    ("visual", "See the word in your example"),
    ("audio", "Hear the word in your example"),
];

/// True when every strategy step has a non-blank answer. Extra keys do not count.
pub fn is_strategy_complete(data: &BTreeMap<String, String>) -> bool {
    completed_steps(data) == STRATEGY_STEPS.len()
}

pub fn completed_steps(data: &BTreeMap<String, String>) -> usize {
    STRATEGY_STEPS
        .iter()
        .filter(|(key, _)| data.get(*key).is_some_and(|answer| !answer.is_blank()))
        .count()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabWord {
    pub id: String,
    pub user_id: String,
    pub word: String,
    pub meaning: String,
    #[serde(default)]
    pub sentence: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub understood: bool,
    #[serde(default)]
    pub strategy_completed: bool,
    #[serde(default)]
    pub strategy_data: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Form contents for a new word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVocabWord {
    pub word: String,
    pub meaning: String,
    pub sentence: String,
    pub tag: String,
    pub understood: bool,
}

impl NewVocabWord {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self { word: word.into(), meaning: meaning.into(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), LearnError> {
        let missing = blank_fields(&[("word", self.word.as_str()), ("meaning", self.meaning.as_str())]);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LearnError::MissingFields(missing.into_iter().map(String::from).collect()))
        }
    }

    fn into_word(self, user_id: &str, now: DateTime<Utc>) -> VocabWord {
        let optional = |value: String| {
            let value = value.trim().to_string();
            (!value.is_empty()).then_some(value)
        };
        VocabWord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            word: self.word.trim().to_string(),
            meaning: self.meaning.trim().to_string(),
            sentence: optional(self.sentence),
            tag: optional(self.tag),
            understood: self.understood,
            strategy_completed: false,
            strategy_data: BTreeMap::new(),
            created_at: now,
        }
    }
}

/// One signed-in user's view of the vocabulary table.
pub struct VocabJournal<R: RemoteStore> {
    remote: R,
    user_id: String,
}

impl<R: RemoteStore> VocabJournal<R> {
    pub fn new(remote: R, user_id: impl Into<String>) -> Self {
        Self { remote, user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn add_word(&self, draft: NewVocabWord) -> Result<VocabWord, LearnError> {
        draft.validate()?;
        let word = draft.into_word(&self.user_id, Utc::now());
        let stored = self.remote.insert(VOCAB_TABLE, serde_json::to_value(&word)?).await?;
        info!(word = %word.word, id = %word.id, "vocab word added");
        Ok(serde_json::from_value(stored)?)
    }

    /// Newest first. Words created at the same instant keep their stored order.
    pub async fn words(&self) -> Result<Vec<VocabWord>, LearnError> {
        let query = Query::from(VOCAB_TABLE)
            .eq("user_id", self.user_id.as_str())
            .order_by("created_at", false);
        let mut words: Vec<VocabWord> = select_as(&self.remote, &query).await?;
        words.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(words)
    }

    pub async fn word(&self, id: &str) -> Result<VocabWord, LearnError> {
        let query = Query::from(VOCAB_TABLE)
            .eq("id", id)
            .eq("user_id", self.user_id.as_str())
            .limit(1);
        select_as(&self.remote, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LearnError::NotFound { kind: "word", id: id.to_string() })
    }

    /// Stores the strategy answers and recomputes `strategy_completed` from them.
    pub async fn save_strategy(
        &self,
        id: &str,
        data: BTreeMap<String, String>,
    ) -> Result<VocabWord, LearnError> {
        self.word(id).await?;
        let completed = is_strategy_complete(&data);
        let patch = json!({ "strategy_data": data, "strategy_completed": completed });
        let stored = self.remote.update(VOCAB_TABLE, id, patch).await?;
        info!(id, completed, "strategy saved");
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn set_understood(&self, id: &str, understood: bool) -> Result<VocabWord, LearnError> {
        self.word(id).await?;
        let stored =
            self.remote.update(VOCAB_TABLE, id, json!({ "understood": understood })).await?;
        Ok(serde_json::from_value(stored)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{
        Duration,
        TimeZone,
    };

    use super::*;
    use crate::remote::MemoryRemote;

    fn full_strategy() -> BTreeMap<String, String> {
        STRATEGY_STEPS
            .iter()
            .map(|(key, _)| (key.to_string(), format!("my {key}")))
            .collect()
    }

    #[test]
    fn test_strategy_completion_requires_every_step() {
        let mut data = full_strategy();
        assert!(is_strategy_complete(&data));

        data.insert("picture".to_string(), "   ".to_string());
        assert!(!is_strategy_complete(&data));
        assert_eq!(completed_steps(&data), 7);

        data.remove("picture");
        data.insert("bonus".to_string(), "extra".to_string());
        assert!(!is_strategy_complete(&data));
    }

    #[test]
    fn test_new_word_validation() {
        assert!(NewVocabWord::new("osmosis", "water through a membrane").validate().is_ok());
        match NewVocabWord::new(" ", "").validate() {
            Err(LearnError::MissingFields(fields)) => assert_eq!(fields, vec!["word", "meaning"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_and_strategy_round_trip() {
        let journal = VocabJournal::new(MemoryRemote::new(), "user-1");
        let mut draft = NewVocabWord::new(" osmosis ", "Movement of water across a membrane");
        draft.tag = "Biology".to_string();
        let word = journal.add_word(draft).await.unwrap();
        assert_eq!(word.word, "osmosis");
        assert_eq!(word.sentence, None);
        assert_eq!(word.tag.as_deref(), Some("Biology"));
        assert!(!word.strategy_completed);

        let saved = journal.save_strategy(&word.id, full_strategy()).await.unwrap();
        assert!(saved.strategy_completed);

        let mut partial = full_strategy();
        partial.insert("audio".to_string(), String::new());
        let saved = journal.save_strategy(&word.id, partial).await.unwrap();
        assert!(!saved.strategy_completed);

        let understood = journal.set_understood(&word.id, true).await.unwrap();
        assert!(understood.understood);
        assert_eq!(journal.word(&word.id).await.unwrap().strategy_data.len(), 8);
    }

    #[tokio::test]
    async fn test_rejected_word_is_not_stored() {
        let journal = VocabJournal::new(MemoryRemote::new(), "user-1");
        assert!(journal.add_word(NewVocabWord::new("osmosis", " ")).await.is_err());
        assert!(journal.words().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_words_are_newest_first_and_scoped_to_user() {
        let remote = Arc::new(MemoryRemote::new());
        let base = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        for (id, user, offset) in [("a", "u1", 0), ("b", "u1", 2), ("c", "u2", 5), ("d", "u1", 1)] {
            let word = VocabWord {
                id: id.to_string(),
                user_id: user.to_string(),
                word: id.to_string(),
                meaning: "m".to_string(),
                sentence: None,
                tag: None,
                understood: false,
                strategy_completed: false,
                strategy_data: BTreeMap::new(),
                created_at: base + Duration::hours(offset),
            };
            remote.insert(VOCAB_TABLE, serde_json::to_value(&word).unwrap()).await.unwrap();
        }

        let journal = VocabJournal::new(remote.clone(), "u1");
        let ids: Vec<_> = journal.words().await.unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["b", "d", "a"]);

        let other = journal.word("c").await;
        assert!(matches!(other, Err(LearnError::NotFound { .. })));
        assert!(journal.set_understood("c", true).await.is_err());
    }
}
