// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference provider trait definition

use async_trait::async_trait;

use super::errors::InferenceError;
use super::types::Detection;

/// The external image-classification capability
///
/// Implementations make exactly one attempt per call; retries, if any, are the
/// provider's own business and invisible to the pipeline.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run `model_id` over the image and return its detections in model order
    ///
    /// # Arguments
    /// * `image` - Raw image bytes as uploaded
    /// * `model_id` - Identifier of the model to run
    async fn infer(&self, image: &[u8], model_id: &str) -> Result<Vec<Detection>, InferenceError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
