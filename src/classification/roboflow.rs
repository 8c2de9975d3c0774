// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted object-detection API client
//!
//! Speaks the Roboflow-style detect protocol: the image is POSTed base64
//! encoded as a form body to `{endpoint}/{model_id}?api_key=...` and the
//! service answers with `{"predictions": [{"class", "confidence", "x", "y",
//! "width", "height"}, ...]}`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::errors::InferenceError;
use super::provider::InferenceProvider;
use super::types::{BoundingBox, Detection};

// --- Wire types ---

#[derive(Debug, Deserialize)]
pub struct DetectResponse {
    pub predictions: Vec<DetectPrediction>,
}

#[derive(Debug, Deserialize)]
pub struct DetectPrediction {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
    #[serde(rename = "class")]
    pub class_name: String,
}

impl From<DetectPrediction> for Detection {
    fn from(p: DetectPrediction) -> Self {
        Detection {
            label: p.class_name,
            confidence: p.confidence as f32,
            bbox: BoundingBox::new(p.x as f32, p.y as f32, p.width as f32, p.height as f32),
        }
    }
}

/// Parse a detect response body into detections
pub fn parse_detect_response(body: &str) -> Result<Vec<Detection>, InferenceError> {
    let response: DetectResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;
    Ok(response.predictions.into_iter().map(Detection::from).collect())
}

/// Client for a hosted detection API
pub struct RoboflowClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl RoboflowClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `endpoint` - Base URL, e.g. `https://detect.roboflow.com`
    /// * `api_key` - Sent as the `api_key` query parameter when present
    /// * `timeout_ms` - Per-request timeout
    pub fn new(endpoint: &str, api_key: Option<String>, timeout_ms: u64) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let trimmed = endpoint.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}/", trimmed))
            .map_err(|e| InferenceError::Transport(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        info!(
            "Inference client configured: endpoint={}, timeout={}ms",
            trimmed, timeout_ms
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
            timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    /// URL for one model, with the api key attached
    pub fn model_url(&self, model_id: &str) -> Result<Url, InferenceError> {
        let mut url = self
            .endpoint
            .join(model_id.trim_matches('/'))
            .map_err(|e| InferenceError::Transport(format!("invalid model id '{}': {}", model_id, e)))?;
        if let Some(ref key) = self.api_key {
            url.query_pairs_mut().append_pair("api_key", key);
        }
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            InferenceError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl InferenceProvider for RoboflowClient {
    async fn infer(&self, image: &[u8], model_id: &str) -> Result<Vec<Detection>, InferenceError> {
        let url = self.model_url(model_id)?;
        debug!("Detect POST {}/{}", self.endpoint(), model_id);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(STANDARD.encode(image))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(InferenceError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let detections = parse_detect_response(&body)?;
        debug!("Model {} returned {} predictions", model_id, detections.len());
        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "roboflow"
    }
}
