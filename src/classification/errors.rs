// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for classification

use thiserror::Error;

use super::types::Stage;
use crate::storage::PersistenceError;

/// Errors returned by an inference provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Connection refused, DNS failure and similar
    #[error("Inference transport error: {0}")]
    Transport(String),

    /// No response within the client timeout
    #[error("Inference timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Non-success HTTP status from the service
    #[error("Inference API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be interpreted as detections
    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),
}

/// Errors from a classification request
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// The inference capability failed or answered with garbage
    #[error("{stage} stage failed on model '{model}': {source}")]
    ExternalService {
        stage: Stage,
        model: String,
        #[source]
        source: InferenceError,
    },

    /// Stage one found nothing and no default fruit key is configured
    #[error("No fruit detected by model '{model}'")]
    NoDetection { model: String },

    /// Rejected before any external call
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    /// The record could not be stored
    #[error("Failed to persist classification: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ClassificationError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ClassificationError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Short machine-readable kind, stable for logs and API layers
    pub fn kind(&self) -> &'static str {
        match self {
            ClassificationError::ExternalService { .. } => "external_service_error",
            ClassificationError::NoDetection { .. } => "no_detection",
            ClassificationError::Validation { .. } => "validation_error",
            ClassificationError::Persistence(_) => "persistence_error",
        }
    }
}
