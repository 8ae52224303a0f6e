//! T.O.T.E. revision cycle: Test, Operate, Re-test, Exit.
//!
//! The re-test step is the only non-linear edge in any activity: a score
//! below 100% sends the learner back to Operate.

use serde::{
    Deserialize,
    Serialize,
};

use super::{
    schema::{
        FieldSpec,
        FieldValue,
        Record,
        Route,
        Schema,
        StepSpec,
    },
    session::{
        Advance,
        SessionState,
        WizardSession,
    },
};
use crate::core::LearnError;

pub const MASTERY_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionStage {
    Test,
    Operate,
    Retest,
    Exit,
    Complete,
}

impl RevisionStage {
    fn from_step(step: &str) -> Self {
        match step {
            "test" => RevisionStage::Test,
            "operate" => RevisionStage::Operate,
            "retest" => RevisionStage::Retest,
            _ => RevisionStage::Exit,
        }
    }

    /// Progress indicator number; exit and complete share the last slot.
    pub fn number(&self) -> u8 {
        match self {
            RevisionStage::Test => 1,
            RevisionStage::Operate => 2,
            RevisionStage::Retest => 3,
            RevisionStage::Exit | RevisionStage::Complete => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionField {
    Topic,
    InitialScore,
    UnknownItems,
    Belief,
    VisualExample,
    Definitions,
    RetestScore,
    Summary,
    NextTopic,
}

impl RevisionField {
    pub fn key(&self) -> &'static str {
        match self {
            RevisionField::Topic => "topic",
            RevisionField::InitialScore => "initial_score",
            RevisionField::UnknownItems => "unknown_items",
            RevisionField::Belief => "belief",
            RevisionField::VisualExample => "visual_example",
            RevisionField::Definitions => "definitions",
            RevisionField::RetestScore => "retest_score",
            RevisionField::Summary => "summary",
            RevisionField::NextTopic => "next_topic",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionCycleState {
    pub topic: String,
    pub initial_score: String,
    pub unknown_items: String,
    pub belief: String,
    pub visual_example: String,
    pub definitions: String,
    pub retest_score: String,
    pub summary: String,
    pub next_topic: String,
}

impl RevisionCycleState {
    fn from_record(record: &Record) -> Self {
        let text = |field: RevisionField| match record.get(field.key()) {
            Some(FieldValue::Text(text)) => text.clone(),
            _ => String::new(),
        };

        Self {
            topic: text(RevisionField::Topic),
            initial_score: text(RevisionField::InitialScore),
            unknown_items: text(RevisionField::UnknownItems),
            belief: text(RevisionField::Belief),
            visual_example: text(RevisionField::VisualExample),
            definitions: text(RevisionField::Definitions),
            retest_score: text(RevisionField::RetestScore),
            summary: text(RevisionField::Summary),
            next_topic: text(RevisionField::NextTopic),
        }
    }
}

/// Parses "80", "80%" or " 80 % " into 80. Anything else is `None`.
pub fn parse_score(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    digits.parse::<u32>().ok()
}

fn route_after_retest(record: &Record) -> Route {
    let raw = match record.get(RevisionField::RetestScore.key()) {
        Some(FieldValue::Text(text)) => text.as_str(),
        _ => "",
    };

    match parse_score(raw) {
        Some(score) if score < MASTERY_SCORE => Route::Goto("operate"),
        Some(MASTERY_SCORE) => Route::Forward,
        Some(_) => Route::Reject {
            field: RevisionField::RetestScore.key(),
            message: "A score can't be more than 100%".to_string(),
        },
        None => Route::Reject {
            field: RevisionField::RetestScore.key(),
            message: "Enter your retest score as a percentage, e.g. 80%".to_string(),
        },
    }
}

pub fn revision_schema() -> Schema {
    Schema::new("revision_cycle")
        .step(
            StepSpec::new("test", "TEST – What Do You Know?")
                .field(FieldSpec::text(RevisionField::Topic.key()))
                .field(FieldSpec::text(RevisionField::InitialScore.key()))
                .field(FieldSpec::text(RevisionField::UnknownItems.key())),
        )
        .step(
            StepSpec::new("operate", "OPERATE – Fix What You Don't Know")
                .field(FieldSpec::text(RevisionField::Belief.key()))
                .field(FieldSpec::text(RevisionField::VisualExample.key()))
                .field(FieldSpec::text(RevisionField::Definitions.key()))
                .incomplete("Please complete all strategies"),
        )
        .step(
            StepSpec::new("retest", "RE-TEST – Check Your Progress")
                .field(FieldSpec::text(RevisionField::RetestScore.key()))
                .incomplete("Please enter your retest score")
                .route(route_after_retest),
        )
        .step(
            StepSpec::new("exit", "EXIT – Summarise and Move On")
                .field(FieldSpec::text(RevisionField::Summary.key()))
                .field(FieldSpec::text(RevisionField::NextTopic.key()))
                .incomplete("Please complete both fields to finish"),
        )
}

#[derive(Debug, Clone)]
pub struct RevisionCycle {
    session: WizardSession,
    loops: u32,
}

impl Default for RevisionCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionCycle {
    pub fn new() -> Self {
        Self { session: WizardSession::new(revision_schema()), loops: 0 }
    }

    pub fn stage(&self) -> RevisionStage {
        match self.session.state() {
            SessionState::Active { step, .. } => RevisionStage::from_step(step),
            SessionState::Complete => RevisionStage::Complete,
        }
    }

    pub fn set(&mut self, field: RevisionField, value: &str) -> Result<(), LearnError> {
        self.session.set(field.key(), value)
    }

    pub fn advance(&mut self) -> Advance {
        let result = self.session.advance();
        if let Advance::Moved { looped: true, .. } = result {
            self.loops += 1;
        }
        result
    }

    /// Times the learner was sent back from Re-test to Operate.
    pub fn loops(&self) -> u32 {
        self.loops
    }

    pub fn state(&self) -> RevisionCycleState {
        RevisionCycleState::from_record(self.session.record())
    }

    pub fn restart(&mut self) {
        self.session.reset();
        self.loops = 0;
    }
}
