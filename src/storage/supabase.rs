// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Supabase (PostgREST) record store
//!
//! Rows go to `{url}/rest/v1/{table}`; reads use `select=*`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::record_store::{record_row, PersistenceError, RecordStore};
use super::stored_record::StoredRecord;
use crate::classification::types::ClassificationRecord;

/// Default table name
pub const DEFAULT_TABLE: &str = "classifications";

pub struct SupabaseRecordStore {
    client: Client,
    table_url: Url,
    api_key: String,
}

impl SupabaseRecordStore {
    /// Create a store for `table` in the project at `url`
    pub fn new(url: &str, api_key: &str, table: &str, timeout_ms: u64) -> Result<Self, PersistenceError> {
        if table.trim().is_empty() {
            return Err(PersistenceError::Transport("table name is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let base = url.trim_end_matches('/');
        let table_url = Url::parse(&format!("{}/rest/v1/{}", base, table.trim()))
            .map_err(|e| PersistenceError::Transport(format!("invalid store url '{}': {}", url, e)))?;

        info!("Supabase store configured: {}", table_url);

        Ok(Self {
            client,
            table_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

/// Parse a `select` response body into rows
pub fn parse_rows(body: &str) -> Result<Vec<StoredRecord>, PersistenceError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| PersistenceError::MalformedResponse(e.to_string()))?;
    match value {
        Value::Array(rows) => Ok(rows.iter().map(StoredRecord::from_value).collect()),
        other => Err(PersistenceError::MalformedResponse(format!(
            "expected an array of rows, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl RecordStore for SupabaseRecordStore {
    async fn insert(&self, record_id: &str, record: &ClassificationRecord) -> Result<(), PersistenceError> {
        let row = record_row(record_id, record)?;

        let response = self
            .authorized(self.client.post(self.table_url.clone()))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Insert of {} rejected: {} {}", record_id, status, message);
            return Err(PersistenceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Inserted record {}", record_id);
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<StoredRecord>, PersistenceError> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("select", "*");

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(PersistenceError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let rows = parse_rows(&body)?;
        debug!("Selected {} rows", rows.len());
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
