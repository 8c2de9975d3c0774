// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory record store
//!
//! Holds rows as JSON exactly as a remote store would, so records read back
//! through [`StoredRecord::from_value`] like they would from the database.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::record_store::{record_row, PersistenceError, RecordStore};
use super::stored_record::StoredRecord;
use crate::classification::types::ClassificationRecord;

#[derive(Default)]
struct Rows {
    rows: Vec<Value>,
    ids: HashSet<String>,
}

/// Append-only in-memory store
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<RwLock<Rows>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw row, bypassing record serialization
    pub async fn insert_raw(&self, row: Value) {
        let mut inner = self.inner.write().await;
        if let Some(id) = row.get("id").and_then(Value::as_str) {
            inner.ids.insert(id.to_string());
        }
        inner.rows.push(row);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rows.is_empty()
    }

    pub async fn clear(&self) {
        info!("🧹 Clearing in-memory record store");
        let mut inner = self.inner.write().await;
        inner.rows.clear();
        inner.ids.clear();
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record_id: &str, record: &ClassificationRecord) -> Result<(), PersistenceError> {
        let row = record_row(record_id, record)?;

        let mut inner = self.inner.write().await;
        if !inner.ids.insert(record_id.to_string()) {
            return Err(PersistenceError::Rejected {
                status: 409,
                message: format!("duplicate record id {}", record_id),
            });
        }
        inner.rows.push(row);

        debug!("📥 Stored record {} ({} rows)", record_id, inner.rows.len());
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<StoredRecord>, PersistenceError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().map(StoredRecord::from_value).collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
