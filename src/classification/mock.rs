// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scripted inference provider for tests and dry runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::errors::InferenceError;
use super::provider::InferenceProvider;
use super::types::{BoundingBox, Detection};

/// Answers each model id with a fixed response and records every call
#[derive(Default)]
pub struct MockInferenceProvider {
    responses: HashMap<String, Result<Vec<Detection>, InferenceError>>,
    fallback: Option<Vec<Detection>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockInferenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `model_id` with these detections
    pub fn with_response(mut self, model_id: &str, detections: Vec<Detection>) -> Self {
        self.responses.insert(model_id.to_string(), Ok(detections));
        self
    }

    /// Fail every call to `model_id`
    pub fn with_failure(mut self, model_id: &str, error: InferenceError) -> Self {
        self.responses.insert(model_id.to_string(), Err(error));
        self
    }

    /// Answer unscripted models with these detections instead of an error
    pub fn with_fallback(mut self, detections: Vec<Detection>) -> Self {
        self.fallback = Some(detections);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Model ids requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

/// Shorthand for a detection with a unit box
pub fn detection(label: &str, confidence: f32) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
    }
}

#[async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn infer(&self, _image: &[u8], model_id: &str) -> Result<Vec<Detection>, InferenceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(model_id.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(model_id) {
            Some(response) => response.clone(),
            None => self.fallback.clone().ok_or_else(|| InferenceError::ApiError {
                status: 404,
                message: format!("model '{}' not found", model_id),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
