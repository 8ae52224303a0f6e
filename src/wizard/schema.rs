use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::utils::Blank;

/// Answers collected so far, keyed by field name.
pub type Record = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.is_blank(),
            FieldValue::Flag(_) => true,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Flag(_) => FieldKind::Flag,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
}

#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    Required,
    Optional,
    /// Required only while the predicate holds for the current record.
    RequiredWhen(fn(&Record) -> bool),
}

impl Requirement {
    pub fn applies(&self, record: &Record) -> bool {
        match self {
            Requirement::Required => true,
            Requirement::Optional => false,
            Requirement::RequiredWhen(predicate) => predicate(record),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn text(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Text, requirement: Requirement::Required, default: None }
    }

    pub fn flag(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: FieldKind::Flag,
            requirement: Requirement::Required,
            default: Some(FieldValue::Flag(default)),
        }
    }

    pub fn optional(mut self) -> Self {
        self.requirement = Requirement::Optional;
        self
    }

    pub fn required_when(mut self, predicate: fn(&Record) -> bool) -> Self {
        self.requirement = Requirement::RequiredWhen(predicate);
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Outcome of a step's branch rule, evaluated after its required fields
/// are known to be filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Forward,
    Goto(&'static str),
    Reject { field: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct StepSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
    pub incomplete_message: &'static str,
    pub route: Option<fn(&Record) -> Route>,
}

impl StepSpec {
    pub fn new(id: &'static str, title: &'static str) -> Self {
        Self {
            id,
            title,
            fields: Vec::new(),
            incomplete_message: "Please complete all fields",
            route: None,
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn incomplete(mut self, message: &'static str) -> Self {
        self.incomplete_message = message;
        self
    }

    pub fn route(mut self, route: fn(&Record) -> Route) -> Self {
        self.route = Some(route);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub steps: Vec<StepSpec>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self { name, steps: Vec::new() }
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        debug_assert!(
            self.steps.iter().all(|existing| existing.id != step.id),
            "duplicate step id {}",
            step.id
        );
        self.steps.push(step);
        self
    }

    pub fn index_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == step_id)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.steps.iter().flat_map(|step| step.fields.iter()).find(|field| field.name == name)
    }

    pub fn defaults(&self) -> Record {
        self.steps
            .iter()
            .flat_map(|step| step.fields.iter())
            .filter_map(|field| field.default.clone().map(|value| (field.name.to_string(), value)))
            .collect()
    }
}
