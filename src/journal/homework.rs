use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::core::LearnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskCategory {
    Subject,
    ProjectDueBy,
    ProjectPlan,
    TestDate,
    Sport,
    SocialEvents,
    RevisedSubject,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 8] = [
        TaskCategory::Subject,
        TaskCategory::ProjectDueBy,
        TaskCategory::ProjectPlan,
        TaskCategory::TestDate,
        TaskCategory::Sport,
        TaskCategory::SocialEvents,
        TaskCategory::RevisedSubject,
        TaskCategory::Other,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            TaskCategory::Subject => "Subject",
            TaskCategory::ProjectDueBy => "Project Due By",
            TaskCategory::ProjectPlan => "Project Plan",
            TaskCategory::TestDate => "Test Date",
            TaskCategory::Sport => "Sport",
            TaskCategory::SocialEvents => "Social Events",
            TaskCategory::RevisedSubject => "Revised Subject",
            TaskCategory::Other => "Other",
        }
    }
}

/// Per-category fields. Sport tracks `trained` where the rest track `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TaskDetails {
    Subject { description: String, completed: bool },
    ProjectDueBy { description: String, daily_task: String, completed: bool },
    ProjectPlan { text: String, completed: bool },
    TestDate { criteria: String, goal: String, completed: bool },
    Sport { event_date: String, trained: bool },
    SocialEvents { preparation: String, completed: bool },
    RevisedSubject { criteria: String, completed: bool },
    Other { input: String, completed: bool },
}

impl TaskDetails {
    pub fn blank(category: TaskCategory) -> Self {
        match category {
            TaskCategory::Subject => TaskDetails::Subject {
                description: String::new(),
                completed: false,
            },
            TaskCategory::ProjectDueBy => TaskDetails::ProjectDueBy {
                description: String::new(),
                daily_task: String::new(),
                completed: false,
            },
            TaskCategory::ProjectPlan => TaskDetails::ProjectPlan {
                text: String::new(),
                completed: false,
            },
            TaskCategory::TestDate => TaskDetails::TestDate {
                criteria: String::new(),
                goal: String::new(),
                completed: false,
            },
            TaskCategory::Sport => TaskDetails::Sport {
                event_date: String::new(),
                trained: false,
            },
            TaskCategory::SocialEvents => TaskDetails::SocialEvents {
                preparation: String::new(),
                completed: false,
            },
            TaskCategory::RevisedSubject => TaskDetails::RevisedSubject {
                criteria: String::new(),
                completed: false,
            },
            TaskCategory::Other => TaskDetails::Other {
                input: String::new(),
                completed: false,
            },
        }
    }

    pub fn category(&self) -> TaskCategory {
        match self {
            TaskDetails::Subject { .. } => TaskCategory::Subject,
            TaskDetails::ProjectDueBy { .. } => TaskCategory::ProjectDueBy,
            TaskDetails::ProjectPlan { .. } => TaskCategory::ProjectPlan,
            TaskDetails::TestDate { .. } => TaskCategory::TestDate,
            TaskDetails::Sport { .. } => TaskCategory::Sport,
            TaskDetails::SocialEvents { .. } => TaskCategory::SocialEvents,
            TaskDetails::RevisedSubject { .. } => TaskCategory::RevisedSubject,
            TaskDetails::Other { .. } => TaskCategory::Other,
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            TaskDetails::Sport { trained, .. } => *trained,
            TaskDetails::Subject { completed, .. }
            | TaskDetails::ProjectDueBy { completed, .. }
            | TaskDetails::ProjectPlan { completed, .. }
            | TaskDetails::TestDate { completed, .. }
            | TaskDetails::SocialEvents { completed, .. }
            | TaskDetails::RevisedSubject { completed, .. }
            | TaskDetails::Other { completed, .. } => *completed,
        }
    }

    fn done_flag(&mut self) -> &mut bool {
        match self {
            TaskDetails::Sport { trained, .. } => trained,
            TaskDetails::Subject { completed, .. }
            | TaskDetails::ProjectDueBy { completed, .. }
            | TaskDetails::ProjectPlan { completed, .. }
            | TaskDetails::TestDate { completed, .. }
            | TaskDetails::SocialEvents { completed, .. }
            | TaskDetails::RevisedSubject { completed, .. }
            | TaskDetails::Other { completed, .. } => completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    #[serde(flatten)]
    pub details: TaskDetails,
}

impl TaskItem {
    pub fn blank(category: TaskCategory) -> Self {
        Self { id: Uuid::new_v4().to_string(), details: TaskDetails::blank(category) }
    }

    pub fn category(&self) -> TaskCategory {
        self.details.category()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiaryStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkDiary {
    items: Vec<TaskItem>,
}

impl Default for HomeworkDiary {
    fn default() -> Self {
        Self { items: TaskCategory::ALL.iter().map(|c| TaskItem::blank(*c)).collect() }
    }
}

impl HomeworkDiary {
    /// Tops up any category left without items, e.g. by an older save.
    pub fn normalized(mut self) -> Self {
        for category in TaskCategory::ALL {
            if !self.items.iter().any(|item| item.category() == category) {
                self.items.push(TaskItem::blank(category));
            }
        }
        self
    }

    /// Builds a diary from the older layout: one array of untagged items per
    /// category name. Fields an item lacks keep their blank values.
    pub fn from_sections(sections: BTreeMap<TaskCategory, Vec<Value>>) -> Self {
        let mut items = Vec::new();
        for (category, section) in sections {
            for raw in section {
                match legacy_item(category, raw) {
                    Ok(item) => items.push(item),
                    Err(e) => warn!(?category, "Skipping unreadable task: {}", e),
                }
            }
        }
        Self { items }.normalized()
    }

    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    pub fn section(&self, category: TaskCategory) -> Vec<&TaskItem> {
        self.items.iter().filter(|item| item.category() == category).collect()
    }

    pub fn item(&self, id: &str) -> Option<&TaskItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut TaskItem, LearnError> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| LearnError::NotFound { kind: "task", id: id.to_string() })
    }

    /// Appends a blank item to `category` and returns its id.
    pub fn add_item(&mut self, category: TaskCategory) -> String {
        let item = TaskItem::blank(category);
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    /// Replaces an item's fields. The category of an item never changes.
    pub fn update(&mut self, id: &str, details: TaskDetails) -> Result<(), LearnError> {
        let item = self.item_mut(id)?;
        if item.category() != details.category() {
            return Err(LearnError::Validation(format!(
                "Task belongs to {}, not {}",
                item.category().title(),
                details.category().title()
            )));
        }
        item.details = details;
        Ok(())
    }

    /// Flips the done flag and returns the new value.
    pub fn toggle_complete(&mut self, id: &str) -> Result<bool, LearnError> {
        let flag = self.item_mut(id)?.details.done_flag();
        *flag = !*flag;
        Ok(*flag)
    }

    /// Returns `Ok(false)` without removing when the item is the last of its category.
    pub fn remove_item(&mut self, id: &str) -> Result<bool, LearnError> {
        let category = self
            .item(id)
            .map(TaskItem::category)
            .ok_or_else(|| LearnError::NotFound { kind: "task", id: id.to_string() })?;

        if self.section(category).len() <= 1 {
            return Ok(false);
        }
        self.items.retain(|item| item.id != id);
        Ok(true)
    }

    pub fn stats(&self) -> DiaryStats {
        let total = self.items.len();
        let completed = self.items.iter().filter(|item| item.details.is_done()).count();
        DiaryStats { total, completed, pending: total - completed }
    }
}

fn legacy_item(category: TaskCategory, raw: Value) -> Result<TaskItem, LearnError> {
    let fields = match raw {
        Value::Object(fields) => fields,
        other => return Err(LearnError::Validation(format!("expected an object, got {other}"))),
    };
    let mut item = serde_json::to_value(TaskItem::blank(category))?;
    if let Value::Object(target) = &mut item {
        target.extend(fields.into_iter().filter(|(_, value)| !value.is_null()));
        target.insert("category".to_string(), serde_json::to_value(category)?);
    }
    Ok(serde_json::from_value(item)?)
}
