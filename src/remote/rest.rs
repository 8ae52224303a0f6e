use async_trait::async_trait;
use reqwest::{
    Client,
    Method,
    RequestBuilder,
};
use serde_json::Value;
use tracing::{
    debug,
    warn,
};

use super::{
    Query,
    RemoteStore,
};
use crate::{
    core::LearnError,
    settings::RemoteSettings,
};

/// PostgREST-style HTTP backend (`{base}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestRemote {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRemote {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url, api_key: api_key.into() }
    }

    pub fn from_settings(settings: &RemoteSettings) -> Self {
        Self::new(settings.base_url.clone(), settings.api_key.clone())
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send_rows(&self, request: RequestBuilder) -> Result<Vec<Value>, LearnError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "remote request failed");
            return Err(LearnError::persistence("remote rows", format!("{status}: {body}")));
        }
        let rows: Vec<Value> = response.json().await?;
        debug!(count = rows.len(), "remote rows returned");
        Ok(rows)
    }

    fn first_row(table: &str, rows: Vec<Value>) -> Result<Value, LearnError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| LearnError::persistence(table, "no row returned"))
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn insert(&self, table: &str, row: Value) -> Result<Value, LearnError> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row);
        Self::first_row(table, self.send_rows(request).await?)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, LearnError> {
        let request = self
            .request(Method::PATCH, table)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LearnError::NotFound { kind: "row", id: format!("{table}/{id}") })
    }

    async fn update_where(&self, query: &Query, patch: Value) -> Result<usize, LearnError> {
        let params: Vec<(String, String)> = Query { order: None, limit: None, ..query.clone() }.to_params();
        let request = self
            .request(Method::PATCH, &query.table)
            .query(&params)
            .header("Prefer", "return=representation")
            .json(&patch);
        Ok(self.send_rows(request).await?.len())
    }

    async fn upsert(&self, table: &str, key_columns: &[&str], row: Value) -> Result<Value, LearnError> {
        let request = self
            .request(Method::POST, table)
            .query(&[("on_conflict", key_columns.join(","))])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);
        Self::first_row(table, self.send_rows(request).await?)
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>, LearnError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_params());
        let request = self.request(Method::GET, &query.table).query(&params);
        self.send_rows(request).await
    }
}
