use tracing::{
    debug,
    warn,
};

use super::schema::{
    FieldKind,
    FieldValue,
    Record,
    Route,
    Schema,
    StepSpec,
};
use crate::core::{
    LearnError,
    Notice,
    NoticeKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active { index: usize, step: &'static str },
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved { from: &'static str, to: &'static str, looped: bool },
    /// Nothing changed. `missing` lists the blank required fields, if any.
    Blocked { missing: Vec<&'static str>, notice: Notice },
    Completed(Record),
}

impl Advance {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Advance::Blocked { .. })
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Advance::Blocked { notice, .. } => Some(notice),
            _ => None,
        }
    }
}

/// In-memory state of one guided activity. Nothing here touches storage;
/// callers persist the completed record themselves.
#[derive(Debug, Clone)]
pub struct WizardSession {
    schema: Schema,
    index: usize,
    record: Record,
    complete: bool,
}

impl WizardSession {
    pub fn new(schema: Schema) -> Self {
        let record = schema.defaults();
        Self { schema, index: 0, record, complete: false }
    }

    /// Resumes a session at the first step with previously collected answers.
    pub fn with_record(schema: Schema, record: Record) -> Self {
        let mut session = Self::new(schema);
        session.record.extend(record);
        session
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn state(&self) -> SessionState {
        match self.current_step() {
            Some(step) => SessionState::Active { index: self.index, step: step.id },
            None => SessionState::Complete,
        }
    }

    pub fn current_step(&self) -> Option<&StepSpec> {
        if self.complete {
            None
        } else {
            self.schema.steps.get(self.index)
        }
    }

    /// (1-based step number, step count)
    pub fn progress(&self) -> (usize, usize) {
        let total = self.schema.steps.len();
        if self.complete {
            (total, total)
        } else {
            (self.index + 1, total)
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), LearnError> {
        let value = value.into();
        let field = self.schema.field(name).ok_or_else(|| LearnError::UnknownField {
            schema: self.schema.name.to_string(),
            field: name.to_string(),
        })?;

        if field.kind != value.kind() {
            let expected = match field.kind {
                FieldKind::Text => "text",
                FieldKind::Flag => "a yes/no answer",
            };
            return Err(LearnError::Validation(format!("{name} expects {expected}")));
        }

        self.record.insert(field.name.to_string(), value);
        Ok(())
    }

    pub fn text(&self, name: &str) -> &str {
        match self.record.get(name) {
            Some(FieldValue::Text(text)) => text,
            _ => "",
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.record.get(name) {
            Some(FieldValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let Some(step) = self.current_step() else {
            return Vec::new();
        };

        step.fields
            .iter()
            .filter(|field| field.requirement.applies(&self.record))
            .filter(|field| !self.record.get(field.name).map(FieldValue::is_filled).unwrap_or(false))
            .map(|field| field.name)
            .collect()
    }

    pub fn advance(&mut self) -> Advance {
        if self.complete {
            return Advance::Completed(self.record.clone());
        }

        let Some(step) = self.schema.steps.get(self.index) else {
            self.complete = true;
            return Advance::Completed(self.record.clone());
        };
        let from = step.id;

        let missing = self.missing_fields();
        if !missing.is_empty() {
            debug!(schema = self.schema.name, step = from, ?missing, "advance blocked");
            let notice = Notice::new(
                NoticeKind::Validation,
                step.incomplete_message,
                format!("Missing: {}", missing.join(", ")),
            );
            return Advance::Blocked { missing, notice };
        }

        let route = step.route.map(|route| route(&self.record)).unwrap_or(Route::Forward);
        match route {
            Route::Forward => {
                if self.index + 1 < self.schema.steps.len() {
                    self.index += 1;
                    let to = self.schema.steps[self.index].id;
                    debug!(schema = self.schema.name, from, to, "advanced");
                    Advance::Moved { from, to, looped: false }
                } else {
                    self.complete = true;
                    debug!(schema = self.schema.name, "completed");
                    Advance::Completed(self.record.clone())
                }
            }
            Route::Goto(target) => match self.schema.index_of(target) {
                Some(index) => {
                    let looped = index <= self.index;
                    self.index = index;
                    debug!(schema = self.schema.name, from, to = target, looped, "branched");
                    Advance::Moved { from, to: target, looped }
                }
                None => {
                    warn!(schema = self.schema.name, target, "branch to unknown step");
                    Advance::Blocked {
                        missing: Vec::new(),
                        notice: Notice::new(
                            NoticeKind::Validation,
                            step.incomplete_message,
                            format!("Unknown step {target}"),
                        ),
                    }
                }
            },
            Route::Reject { field, message } => {
                debug!(schema = self.schema.name, step = from, field, "advance rejected");
                Advance::Blocked {
                    missing: vec![field],
                    notice: Notice::new(NoticeKind::Validation, step.incomplete_message, message),
                }
            }
        }
    }

    /// Steps back one screen. A completed session reopens on its last step.
    pub fn retreat(&mut self) -> bool {
        if self.complete {
            self.complete = false;
            self.index = self.schema.steps.len().saturating_sub(1);
            true
        } else if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Reopens the session at the first step, keeping every answer.
    pub fn edit(&mut self) {
        self.complete = false;
        self.index = 0;
    }

    pub fn reset(&mut self) {
        self.record = self.schema.defaults();
        self.index = 0;
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::schema::FieldSpec;

    fn sample_schema() -> Schema {
        Schema::new("sample")
            .step(
                StepSpec::new("first", "First")
                    .field(FieldSpec::text("name"))
                    .field(FieldSpec::text("nickname").optional()),
            )
            .step(
                StepSpec::new("second", "Second")
                    .field(FieldSpec::flag("agree", true))
                    .field(FieldSpec::text("reason").required_when(|record| {
                        record.get("agree") == Some(&FieldValue::Flag(false))
                    })),
            )
            .step(StepSpec::new("third", "Third").field(FieldSpec::text("answer")).route(
                |record| match record.get("answer") {
                    Some(FieldValue::Text(text)) if text == "again" => Route::Goto("first"),
                    Some(FieldValue::Text(text)) if text == "nope" => Route::Reject {
                        field: "answer",
                        message: "Not an answer".to_string(),
                    },
                    _ => Route::Forward,
                },
            ))
    }

    #[test]
    fn test_linear_advance_and_completion() {
        let mut session = WizardSession::new(sample_schema());
        assert_eq!(session.progress(), (1, 3));

        session.set("name", "Ada").unwrap();
        assert_eq!(
            session.advance(),
            Advance::Moved { from: "first", to: "second", looped: false }
        );

        // the flag default satisfies the step
        assert!(matches!(session.advance(), Advance::Moved { to: "third", .. }));

        session.set("answer", "done").unwrap();
        match session.advance() {
            Advance::Completed(record) => {
                assert_eq!(record.get("name"), Some(&FieldValue::Text("Ada".into())));
            }
            other => panic!("Expected completion, got {:?}", other),
        }
        assert!(session.is_complete());
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.progress(), (3, 3));
    }

    #[test]
    fn test_blank_required_field_blocks() {
        let mut session = WizardSession::new(sample_schema());
        session.set("name", "   ").unwrap();

        let result = session.advance();
        assert!(result.is_blocked());
        if let Advance::Blocked { missing, notice } = result {
            assert_eq!(missing, vec!["name"]);
            assert_eq!(notice.kind, NoticeKind::Validation);
            assert_eq!(notice.title, "Please complete all fields");
        }
        assert_eq!(session.state(), SessionState::Active { index: 0, step: "first" });
    }

    #[test]
    fn test_advance_never_moves_with_any_required_field_blank() {
        let schema = Schema::new("grid").step(
            StepSpec::new("only", "Only")
                .field(FieldSpec::text("a"))
                .field(FieldSpec::text("b"))
                .field(FieldSpec::text("c")),
        );

        for mask in 0..8u8 {
            let mut session = WizardSession::new(schema.clone());
            for (bit, name) in ["a", "b", "c"].iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    session.set(name, "filled").unwrap();
                }
            }
            let result = session.advance();
            if mask == 0b111 {
                assert!(matches!(result, Advance::Completed(_)));
            } else {
                assert!(result.is_blocked(), "mask {mask:03b} should block");
                assert_eq!(session.state(), SessionState::Active { index: 0, step: "only" });
            }
        }
    }

    #[test]
    fn test_conditional_requirement() {
        let mut session = WizardSession::new(sample_schema());
        session.set("name", "Ada").unwrap();
        session.advance();

        session.set("agree", false).unwrap();
        assert_eq!(session.missing_fields(), vec!["reason"]);
        assert!(session.advance().is_blocked());

        session.set("reason", "It helps me first").unwrap();
        assert!(matches!(session.advance(), Advance::Moved { to: "third", .. }));
    }

    #[test]
    fn test_branch_and_reject_routes() {
        let mut session = WizardSession::new(sample_schema());
        session.set("name", "Ada").unwrap();
        session.advance();
        session.advance();

        session.set("answer", "again").unwrap();
        assert_eq!(session.advance(), Advance::Moved { from: "third", to: "first", looped: true });

        session.advance();
        session.advance();
        session.set("answer", "nope").unwrap();
        let result = session.advance();
        assert_eq!(result.notice().map(|n| n.message.as_str()), Some("Not an answer"));
        assert_eq!(session.state(), SessionState::Active { index: 2, step: "third" });
    }

    #[test]
    fn test_set_rejects_unknown_and_mistyped_fields() {
        let mut session = WizardSession::new(sample_schema());
        assert!(matches!(session.set("colour", "red"), Err(LearnError::UnknownField { .. })));
        assert!(matches!(session.set("agree", "yes"), Err(LearnError::Validation(_))));
        assert!(session.record().get("colour").is_none());
    }

    #[test]
    fn test_retreat_edit_and_reset() {
        let mut session = WizardSession::new(sample_schema());
        assert!(!session.retreat());

        session.set("name", "Ada").unwrap();
        session.advance();
        assert!(session.retreat());
        assert_eq!(session.progress(), (1, 3));

        session.advance();
        session.advance();
        session.set("answer", "done").unwrap();
        session.advance();
        assert!(session.is_complete());

        session.edit();
        assert_eq!(session.state(), SessionState::Active { index: 0, step: "first" });
        assert_eq!(session.text("name"), "Ada");

        session.reset();
        assert_eq!(session.text("name"), "");
        assert_eq!(session.flag("agree"), Some(true));
    }
}
