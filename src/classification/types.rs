// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for image classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::labels::{CanonicalLabel, FruitKey, LabelNormalizer};

/// Axis-aligned box in image pixels, centre-based as returned by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// A single detection as produced by the inference capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Raw class string from the model
    pub label: String,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    /// Check the values a model may get wrong
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence {} for '{}' is outside [0, 1]",
                self.confidence, self.label
            ));
        }
        if !self.bbox.is_finite() {
            return Err(format!("non-finite bounding box for '{}'", self.label));
        }
        Ok(())
    }

    /// A new detection carrying the canonical label; box and confidence are copied
    pub fn normalized(&self, normalizer: &LabelNormalizer) -> LabeledDetection {
        LabeledDetection {
            label: normalizer.normalize(&self.label),
            raw_label: self.label.clone(),
            confidence: self.confidence,
            bbox: self.bbox,
        }
    }
}

/// A detection whose label has been normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDetection {
    pub label: CanonicalLabel,
    pub raw_label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Which of the two inference calls an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FruitType,
    Ripeness,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FruitType => f.write_str("fruit-type"),
            Stage::Ripeness => f.write_str("ripeness"),
        }
    }
}

/// How `valid_count` is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidityMode {
    /// Valid when confidence >= threshold
    #[default]
    ConfidenceOnly,
    /// Valid when confidence >= threshold and the label equals `validated_class`
    ConfidenceAndLabel,
}

impl ValidityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityMode::ConfidenceOnly => "confidence-only",
            ValidityMode::ConfidenceAndLabel => "confidence-and-label",
        }
    }
}

impl FromStr for ValidityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "confidence-only" | "confidence" => Ok(ValidityMode::ConfidenceOnly),
            "confidence-and-label" | "label" => Ok(ValidityMode::ConfidenceAndLabel),
            other => Err(format!(
                "invalid validity mode '{}'; expected confidence-only or confidence-and-label",
                other
            )),
        }
    }
}

/// Valid/invalid split of a record's detections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityCounts {
    pub valid: u32,
    pub invalid: u32,
}

impl ValidityCounts {
    pub fn compute(
        detections: &[LabeledDetection],
        threshold: f32,
        mode: ValidityMode,
        validated_class: Option<CanonicalLabel>,
    ) -> Self {
        let valid = detections
            .iter()
            .filter(|d| d.confidence >= threshold)
            .filter(|d| match mode {
                ValidityMode::ConfidenceOnly => true,
                ValidityMode::ConfidenceAndLabel => Some(d.label) == validated_class,
            })
            .count() as u32;

        Self {
            valid,
            invalid: detections.len() as u32 - valid,
        }
    }
}

/// Per-request options for `classify`
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Class the caller expects to see
    pub validated_class: Option<CanonicalLabel>,
    /// Confidence threshold for the valid/invalid split
    pub threshold: Option<f32>,
    /// Caller's name for the image (e.g. the uploaded filename)
    pub image_identifier: Option<String>,
    /// Capture time; defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

impl ClassifyOptions {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_validated_class(mut self, label: CanonicalLabel) -> Self {
        self.validated_class = Some(label);
        self
    }

    pub fn with_image_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.image_identifier = Some(identifier.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Outcome of one full classification run over one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub timestamp: DateTime<Utc>,
    pub image_identifier: String,
    pub fruit_type: FruitKey,
    pub model_used: String,
    pub detections: Vec<LabeledDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_class: Option<CanonicalLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_count: Option<u32>,
}

impl ClassificationRecord {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
