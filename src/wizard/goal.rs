use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

use super::{
    schema::{
        FieldSpec,
        FieldValue,
        Record,
        Schema,
        StepSpec,
    },
    session::{
        Advance,
        WizardSession,
    },
};
use crate::{
    core::LearnError,
    journal::Keyed,
};

pub const APP_HELPER: &str = "LearnAnythingStrat App";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    WhatYouWant,
    WhatYouCanDo,
    WhatYoullSee,
    WhatYoullHear,
    WhatYoullFeel,
    IsGoodForOthers,
    InsteadOf,
    When,
    Where,
    WhatWillHelp,
    HowYoullKnow,
}

impl GoalField {
    pub fn key(&self) -> &'static str {
        match self {
            GoalField::WhatYouWant => "what_you_want",
            GoalField::WhatYouCanDo => "what_you_can_do",
            GoalField::WhatYoullSee => "what_youll_see",
            GoalField::WhatYoullHear => "what_youll_hear",
            GoalField::WhatYoullFeel => "what_youll_feel",
            GoalField::IsGoodForOthers => "is_good_for_others",
            GoalField::InsteadOf => "instead_of",
            GoalField::When => "when",
            GoalField::Where => "where",
            GoalField::WhatWillHelp => "what_will_help",
            GoalField::HowYoullKnow => "how_youll_know",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub what_you_want: String,
    pub what_you_can_do: String,
    pub what_youll_see: String,
    pub what_youll_hear: String,
    pub what_youll_feel: String,
    pub is_good_for_others: bool,
    #[serde(default)]
    pub instead_of: String,
    pub when: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub what_will_help: String,
    pub how_youll_know: String,
}

impl Keyed for Goal {
    type Key = String;

    fn natural_key(&self) -> String {
        self.id.clone()
    }
}

impl Goal {
    fn from_record(record: &Record, id: String, created_at: DateTime<Utc>) -> Self {
        let text = |field: GoalField| match record.get(field.key()) {
            Some(FieldValue::Text(text)) => text.trim().to_string(),
            _ => String::new(),
        };
        let is_good_for_others = !matches!(
            record.get(GoalField::IsGoodForOthers.key()),
            Some(FieldValue::Flag(false))
        );

        Self {
            id,
            created_at,
            what_you_want: text(GoalField::WhatYouWant),
            what_you_can_do: text(GoalField::WhatYouCanDo),
            what_youll_see: text(GoalField::WhatYoullSee),
            what_youll_hear: text(GoalField::WhatYoullHear),
            what_youll_feel: text(GoalField::WhatYoullFeel),
            is_good_for_others,
            instead_of: if is_good_for_others { String::new() } else { text(GoalField::InsteadOf) },
            when: text(GoalField::When),
            where_: text(GoalField::Where),
            what_will_help: text(GoalField::WhatWillHelp),
            how_youll_know: text(GoalField::HowYoullKnow),
        }
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        let mut put = |field: GoalField, value: FieldValue| {
            record.insert(field.key().to_string(), value);
        };
        put(GoalField::WhatYouWant, self.what_you_want.clone().into());
        put(GoalField::WhatYouCanDo, self.what_you_can_do.clone().into());
        put(GoalField::WhatYoullSee, self.what_youll_see.clone().into());
        put(GoalField::WhatYoullHear, self.what_youll_hear.clone().into());
        put(GoalField::WhatYoullFeel, self.what_youll_feel.clone().into());
        put(GoalField::IsGoodForOthers, self.is_good_for_others.into());
        put(GoalField::InsteadOf, self.instead_of.clone().into());
        put(GoalField::When, self.when.clone().into());
        put(GoalField::Where, self.where_.clone().into());
        put(GoalField::WhatWillHelp, self.what_will_help.clone().into());
        put(GoalField::HowYoullKnow, self.how_youll_know.clone().into());
        record
    }
}

fn not_good_for_others(record: &Record) -> bool {
    matches!(record.get(GoalField::IsGoodForOthers.key()), Some(FieldValue::Flag(false)))
}

pub fn goal_schema() -> Schema {
    Schema::new("goal_builder")
        .step(StepSpec::new("intro", "Let's Make Your Goal!"))
        .step(
            StepSpec::new("want", "What do you want to happen? Say it in a positive way.")
                .field(FieldSpec::text(GoalField::WhatYouWant.key())),
        )
        .step(
            StepSpec::new("can_do", "What can YOU do to help this happen?")
                .field(FieldSpec::text(GoalField::WhatYouCanDo.key())),
        )
        .step(
            StepSpec::new("sensory", "What will you see, hear and feel when you reach your goal?")
                .field(FieldSpec::text(GoalField::WhatYoullSee.key()))
                .field(FieldSpec::text(GoalField::WhatYoullHear.key()))
                .field(FieldSpec::text(GoalField::WhatYoullFeel.key())),
        )
        .step(
            StepSpec::new("good_for_others", "Is this goal good for you and others?")
                .field(FieldSpec::flag(GoalField::IsGoodForOthers.key(), true))
                .field(
                    FieldSpec::text(GoalField::InsteadOf.key()).required_when(not_good_for_others),
                ),
        )
        .step(
            StepSpec::new("when_where", "When and where will this happen?")
                .field(FieldSpec::text(GoalField::When.key()))
                .field(FieldSpec::text(GoalField::Where.key())),
        )
        .step(
            StepSpec::new("helpers", "What will help you?")
                .field(FieldSpec::text(GoalField::WhatWillHelp.key()).with_default(APP_HELPER)),
        )
        .step(
            StepSpec::new("evidence", "How will you know you've reached your goal?")
                .field(FieldSpec::text(GoalField::HowYoullKnow.key())),
        )
}

/// Goal-setting activity. Building from scratch mints a new id on
/// completion; editing a saved goal keeps its id so saving replaces it.
#[derive(Debug, Clone)]
pub struct GoalBuilder {
    session: WizardSession,
    identity: Option<(String, DateTime<Utc>)>,
}

impl Default for GoalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalBuilder {
    pub fn new() -> Self {
        Self { session: WizardSession::new(goal_schema()), identity: None }
    }

    pub fn edit(goal: &Goal) -> Self {
        Self {
            session: WizardSession::with_record(goal_schema(), goal.to_record()),
            identity: Some((goal.id.clone(), goal.created_at)),
        }
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn set(&mut self, field: GoalField, value: impl Into<FieldValue>) -> Result<(), LearnError> {
        self.session.set(field.key(), value)
    }

    /// Other helpers are listed after the app, which always helps.
    pub fn set_extra_helpers(&mut self, extra: &str) -> Result<(), LearnError> {
        let extra = extra.trim();
        let value =
            if extra.is_empty() { APP_HELPER.to_string() } else { format!("{APP_HELPER}, {extra}") };
        self.set(GoalField::WhatWillHelp, value)
    }

    pub fn extra_helpers(&self) -> &str {
        let helpers = self.session.text(GoalField::WhatWillHelp.key());
        helpers
            .strip_prefix(APP_HELPER)
            .map(|rest| rest.trim_start_matches(',').trim_start())
            .unwrap_or(helpers)
    }

    pub fn advance(&mut self) -> Advance {
        self.session.advance()
    }

    pub fn back(&mut self) -> bool {
        self.session.retreat()
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.identity = None;
    }

    /// The finished goal, or `None` while steps remain.
    pub fn goal(&self, now: DateTime<Utc>) -> Option<Goal> {
        if !self.session.is_complete() {
            return None;
        }

        let (id, created_at) = self
            .identity
            .clone()
            .unwrap_or_else(|| (Uuid::new_v4().to_string(), now));
        Some(Goal::from_record(self.session.record(), id, created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(builder: &mut GoalBuilder) {
        builder.advance();
        builder.set(GoalField::WhatYouWant, "I want to pass maths").unwrap();
        builder.advance();
        builder.set(GoalField::WhatYouCanDo, "Practise every day").unwrap();
        builder.advance();
        builder.set(GoalField::WhatYoullSee, "An A on my report").unwrap();
        builder.set(GoalField::WhatYoullHear, "My teacher saying well done").unwrap();
        builder.set(GoalField::WhatYoullFeel, "Proud").unwrap();
        builder.advance();
        builder.advance();
        builder.set(GoalField::When, "End of term").unwrap();
        builder.set(GoalField::Where, "School").unwrap();
        builder.advance();
        builder.advance();
        builder.set(GoalField::HowYoullKnow, "The grade is on the report").unwrap();
    }

    #[test]
    fn test_goal_flow_has_eight_steps() {
        let builder = GoalBuilder::new();
        assert_eq!(builder.session().progress(), (1, 8));
        assert!(builder.goal(Utc::now()).is_none());
    }

    #[test]
    fn test_complete_goal() {
        let mut builder = GoalBuilder::new();
        fill(&mut builder);
        assert!(matches!(builder.advance(), Advance::Completed(_)));

        let now = Utc::now();
        let goal = builder.goal(now).unwrap();
        assert_eq!(goal.what_you_want, "I want to pass maths");
        assert!(goal.is_good_for_others);
        assert_eq!(goal.what_will_help, APP_HELPER);
        assert_eq!(goal.created_at, now);
        assert!(!goal.id.is_empty());
    }

    #[test]
    fn test_sensory_step_needs_all_three() {
        let mut builder = GoalBuilder::new();
        builder.advance();
        builder.set(GoalField::WhatYouWant, "x").unwrap();
        builder.advance();
        builder.set(GoalField::WhatYouCanDo, "y").unwrap();
        builder.advance();
        builder.set(GoalField::WhatYoullSee, "see").unwrap();
        let result = builder.advance();
        assert!(result.is_blocked());
        if let Advance::Blocked { missing, .. } = result {
            assert_eq!(missing, vec!["what_youll_hear", "what_youll_feel"]);
        }
    }

    #[test]
    fn test_not_good_for_others_needs_alternative() {
        let mut builder = GoalBuilder::new();
        for _ in 0..4 {
            builder.advance();
            builder.set(GoalField::WhatYouWant, "x").unwrap();
            builder.set(GoalField::WhatYouCanDo, "x").unwrap();
            builder.set(GoalField::WhatYoullSee, "x").unwrap();
            builder.set(GoalField::WhatYoullHear, "x").unwrap();
            builder.set(GoalField::WhatYoullFeel, "x").unwrap();
        }
        assert_eq!(builder.session().progress(), (5, 8));

        builder.set(GoalField::IsGoodForOthers, false).unwrap();
        assert!(builder.advance().is_blocked());
        builder.set(GoalField::InsteadOf, "Study with a friend").unwrap();
        assert!(!builder.advance().is_blocked());
    }

    #[test]
    fn test_extra_helpers_follow_app_name() {
        let mut builder = GoalBuilder::new();
        assert_eq!(builder.extra_helpers(), "");
        builder.set_extra_helpers("my tutor").unwrap();
        assert_eq!(builder.session().text("what_will_help"), "LearnAnythingStrat App, my tutor");
        assert_eq!(builder.extra_helpers(), "my tutor");
        builder.set_extra_helpers("  ").unwrap();
        assert_eq!(builder.session().text("what_will_help"), APP_HELPER);
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut builder = GoalBuilder::new();
        fill(&mut builder);
        builder.advance();
        let original = builder.goal(Utc::now()).unwrap();

        let mut editor = GoalBuilder::edit(&original);
        editor.set(GoalField::When, "Next week").unwrap();
        while !matches!(editor.advance(), Advance::Completed(_)) {}

        let edited = editor.goal(Utc::now()).unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.when, "Next week");
        assert_eq!(edited.natural_key(), original.natural_key());
    }
}
