//! Row-oriented remote storage. Rows are JSON objects with snake_case
//! columns; every table has a string `id` primary key.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::{
    Map,
    Value,
};
use uuid::Uuid;

use crate::core::LearnError;

pub mod rest;

pub use rest::RestRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Gt,
}

impl Op {
    fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Lt => "lt",
            Op::Gt => "gt",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: Op,
    pub value: Value,
}

impl Filter {
    pub fn matches(&self, row: &Value) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        match self.op {
            Op::Eq => compare_values(actual, &self.value) == Some(Ordering::Equal),
            Op::Lt => compare_values(actual, &self.value) == Some(Ordering::Less),
            Op::Gt => compare_values(actual, &self.value) == Some(Ordering::Greater),
        }
    }
}

/// Orders two JSON scalars. RFC 3339 strings compare as instants so that
/// timestamps with and without fractional seconds sort correctly.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A filtered select, built the way the PostgREST client chains it.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self { table: table.into(), filters: Vec::new(), order: None, limit: None }
    }

    fn filter(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { column: column.to_string(), op, value: value.into() });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Eq, value)
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Lt, value)
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Gt, value)
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order { column: column.to_string(), ascending });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
    }

    /// Filters, sorts (stable) and truncates `rows` locally.
    pub fn apply(&self, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut selected: Vec<Value> = rows.into_iter().filter(|row| self.matches(row)).collect();

        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ordering = match (a.get(&order.column), b.get(&order.column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }

    /// Query-string pairs in PostgREST syntax (`col=eq.value`, `order=col.desc`).
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), param_value(&f.value))))
            .collect();

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts `row` and returns it as stored.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, LearnError>;

    /// Merges `patch` into the row with `id`. Missing rows are `NotFound`.
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, LearnError>;

    /// Merges `patch` into every row matching `query` and returns how many changed.
    async fn update_where(&self, query: &Query, patch: Value) -> Result<usize, LearnError>;

    /// Inserts `row`, or merges it into the row whose `key_columns` all match.
    async fn upsert(&self, table: &str, key_columns: &[&str], row: Value) -> Result<Value, LearnError>;

    async fn select(&self, query: &Query) -> Result<Vec<Value>, LearnError>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn insert(&self, table: &str, row: Value) -> Result<Value, LearnError> {
        (**self).insert(table, row).await
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, LearnError> {
        (**self).update(table, id, patch).await
    }

    async fn update_where(&self, query: &Query, patch: Value) -> Result<usize, LearnError> {
        (**self).update_where(query, patch).await
    }

    async fn upsert(&self, table: &str, key_columns: &[&str], row: Value) -> Result<Value, LearnError> {
        (**self).upsert(table, key_columns, row).await
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>, LearnError> {
        (**self).select(query).await
    }
}

pub async fn select_as<T, R>(remote: &R, query: &Query) -> Result<Vec<T>, LearnError>
where
    T: DeserializeOwned,
    R: RemoteStore + ?Sized,
{
    remote
        .select(query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(LearnError::from))
        .collect()
}

fn as_object(table: &str, value: Value) -> Result<Map<String, Value>, LearnError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(LearnError::Validation(format!(
            "Rows for {table} must be JSON objects, got {other}"
        ))),
    }
}

fn merge(target: &mut Value, patch: Map<String, Value>) {
    if let Value::Object(map) = target {
        map.extend(patch);
    }
}

/// In-process tables, used by tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<T>(&self, table: &str, f: impl FnOnce(&mut Vec<Value>) -> T) -> Result<T, LearnError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| LearnError::Custom("remote table lock poisoned".to_string()))?;
        Ok(f(tables.entry(table.to_string()).or_default()))
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn insert(&self, table: &str, row: Value) -> Result<Value, LearnError> {
        let mut row = as_object(table, row)?;
        row.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        let row = Value::Object(row);
        self.with_table(table, |rows| rows.push(row.clone()))?;
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, LearnError> {
        let patch = as_object(table, patch)?;
        self.with_table(table, |rows| {
            rows.iter_mut()
                .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
                .map(|row| {
                    merge(row, patch);
                    row.clone()
                })
        })?
        .ok_or_else(|| LearnError::NotFound { kind: "row", id: format!("{table}/{id}") })
    }

    async fn update_where(&self, query: &Query, patch: Value) -> Result<usize, LearnError> {
        let patch = as_object(&query.table, patch)?;
        self.with_table(&query.table, |rows| {
            let mut changed = 0;
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                merge(row, patch.clone());
                changed += 1;
            }
            changed
        })
    }

    async fn upsert(&self, table: &str, key_columns: &[&str], row: Value) -> Result<Value, LearnError> {
        let mut incoming = as_object(table, row)?;
        self.with_table(table, |rows| {
            let existing = rows.iter_mut().find(|row| {
                key_columns.iter().all(|column| {
                    matches!(
                        (row.get(*column), incoming.get(*column)),
                        (Some(a), Some(b)) if a == b
                    )
                })
            });
            match existing {
                Some(row) => {
                    merge(row, incoming);
                    row.clone()
                }
                None => {
                    incoming
                        .entry("id")
                        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
                    let row = Value::Object(incoming);
                    rows.push(row.clone());
                    row
                }
            }
        })
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>, LearnError> {
        self.with_table(&query.table, |rows| query.apply(rows.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_timestamps_compare_as_instants() {
        let whole = json!("2024-03-01T09:00:00Z");
        let fractional = json!("2024-03-01T09:00:00.500Z");
        assert_eq!(compare_values(&fractional, &whole), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(3), &json!(3.0)), Some(Ordering::Equal));
        assert_eq!(compare_values(&json!(null), &json!(1)), None);
    }

    #[test]
    fn test_query_params() {
        let query = Query::from("subscriptions")
            .eq("user_id", "u1")
            .eq("status", "active")
            .gt("expires_at", "2024-01-01T00:00:00Z")
            .order_by("expires_at", false)
            .limit(1);
        assert_eq!(
            query.to_params(),
            vec![
                ("user_id".to_string(), "eq.u1".to_string()),
                ("status".to_string(), "eq.active".to_string()),
                ("expires_at".to_string(), "gt.2024-01-01T00:00:00Z".to_string()),
                ("order".to_string(), "expires_at.desc".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_apply_sort_is_stable() {
        let rows = vec![
            json!({ "id": "a", "rank": 1 }),
            json!({ "id": "b", "rank": 2 }),
            json!({ "id": "c", "rank": 1 }),
            json!({ "id": "d" }),
        ];
        let ids: Vec<_> = Query::from("t")
            .order_by("rank", true)
            .apply(rows.clone())
            .iter()
            .map(|row| row["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "c", "b", "d"]);

        let top = Query::from("t").lt("rank", 2).limit(1).apply(rows);
        assert_eq!(top, vec![json!({ "id": "a", "rank": 1 })]);
    }

    #[tokio::test]
    async fn test_memory_remote_crud() {
        let remote = MemoryRemote::new();
        let row = remote.insert("vocab_words", json!({ "word": "osmosis" })).await.unwrap();
        let id = row["id"].as_str().unwrap().to_string();

        let updated =
            remote.update("vocab_words", &id, json!({ "understood": true })).await.unwrap();
        assert_eq!(updated["word"], "osmosis");
        assert_eq!(updated["understood"], true);

        let missing = remote.update("vocab_words", "nope", json!({})).await;
        assert!(matches!(missing, Err(LearnError::NotFound { .. })));

        assert!(remote.insert("vocab_words", json!("not a row")).await.is_err());

        let found = remote.select(&Query::from("vocab_words").eq("id", id.as_str())).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_and_update_where() {
        let remote = MemoryRemote::new();
        remote.upsert("subs", &["user_id"], json!({ "user_id": "u1", "plan": "premium" })).await.unwrap();
        remote.upsert("subs", &["user_id"], json!({ "user_id": "u1", "plan": "family" })).await.unwrap();
        remote.upsert("subs", &["user_id"], json!({ "user_id": "u2", "plan": "ad-free" })).await.unwrap();

        let all = remote.select(&Query::from("subs")).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["plan"], "family");

        let changed = remote
            .update_where(&Query::from("subs").eq("user_id", "u2"), json!({ "status": "cancelled" }))
            .await
            .unwrap();
        assert_eq!(changed, 1);
        let cancelled = remote.select(&Query::from("subs").eq("status", "cancelled")).await.unwrap();
        assert_eq!(cancelled[0]["user_id"], "u2");
    }
}
