// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lenient read-side view of persisted rows
//!
//! Rows may predate the current schema or table vocabulary, so nothing here
//! fails: unusable fields become `None` and a row whose `detections` field is
//! present but unusable is flagged `malformed`.

use serde::Serialize;
use serde_json::{Map, Value};

/// One detection as read back from the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoredDetection {
    pub label: Option<String>,
    pub confidence: Option<f64>,
}

impl StoredDetection {
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };
        Self {
            label: fields
                .get("label")
                .or_else(|| fields.get("class"))
                .and_then(Value::as_str)
                .map(str::to_string),
            confidence: fields.get("confidence").and_then(Value::as_f64),
        }
    }
}

/// One persisted row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoredRecord {
    pub id: Option<String>,
    /// Raw timestamp text; parsed by the aggregation engine
    pub timestamp: Option<String>,
    pub image_identifier: Option<String>,
    pub fruit_type: Option<String>,
    pub model_used: Option<String>,
    /// `None` when the row has neither a detections field nor a row-level label
    pub detections: Option<Vec<StoredDetection>>,
    /// The row is not an object, or its detections field is unusable
    pub malformed: bool,
}

impl StoredRecord {
    /// Parse a row; never fails
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self {
                malformed: true,
                ..Self::default()
            };
        };

        let (mut detections, malformed) = parse_detections(fields.get("detections"));
        // Flat rows carry one prediction as row-level label/confidence
        if detections.is_none() && !malformed {
            let flat = StoredDetection::from_value(value);
            if flat.label.is_some() {
                detections = Some(vec![flat]);
            }
        }

        Self {
            id: text_field(fields, "id"),
            timestamp: text_field(fields, "timestamp").or_else(|| text_field(fields, "created_at")),
            image_identifier: text_field(fields, "image_identifier")
                .or_else(|| text_field(fields, "filename")),
            fruit_type: text_field(fields, "fruit_type"),
            model_used: text_field(fields, "model_used"),
            detections,
            malformed,
        }
    }

    /// Detections, treating a missing field as empty
    pub fn detections_or_empty(&self) -> &[StoredDetection] {
        self.detections.as_deref().unwrap_or(&[])
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_detections(value: Option<&Value>) -> (Option<Vec<StoredDetection>>, bool) {
    match value {
        None | Some(Value::Null) => (None, false),
        Some(Value::Array(items)) => (
            Some(items.iter().map(StoredDetection::from_value).collect()),
            false,
        ),
        // Some stores hand back json columns as text
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => (
                Some(items.iter().map(StoredDetection::from_value).collect()),
                false,
            ),
            _ => (None, true),
        },
        Some(_) => (None, true),
    }
}
