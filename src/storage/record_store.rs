// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistence capability trait and error types

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::stored_record::StoredRecord;
use crate::classification::types::ClassificationRecord;

/// Errors raised by a record store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    /// The store could not be reached
    #[error("Store transport error: {0}")]
    Transport(String),

    /// The store answered and refused the operation
    #[error("Store rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The store answered with something that is not a list of rows
    #[error("Malformed store response: {0}")]
    MalformedResponse(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(String),
}

/// The persistence capability
///
/// Inserts must report failure; a store that cannot confirm a write returns an
/// error rather than `Ok(())`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append one record under a caller-assigned id
    async fn insert(&self, record_id: &str, record: &ClassificationRecord) -> Result<(), PersistenceError>;

    /// Every stored row, leniently parsed
    async fn select_all(&self) -> Result<Vec<StoredRecord>, PersistenceError>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// The JSON row written for a record: its fields plus `id`
pub fn record_row(record_id: &str, record: &ClassificationRecord) -> Result<Value, PersistenceError> {
    let mut row =
        serde_json::to_value(record).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    match row.as_object_mut() {
        Some(fields) => {
            fields.insert("id".to_string(), Value::String(record_id.to_string()));
            Ok(row)
        }
        None => Err(PersistenceError::Serialization(
            "record did not serialize to an object".to_string(),
        )),
    }
}
