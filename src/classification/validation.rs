// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request validation, run before any external call

use image::ImageFormat;

use super::errors::ClassificationError;
use super::types::{ClassifyOptions, ValidityMode};

/// Maximum upload size (10MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Formats the detection service accepts
const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// Sniff the image container from its magic bytes
pub fn detect_format(image: &[u8]) -> Option<ImageFormat> {
    image::guess_format(image)
        .ok()
        .filter(|f| SUPPORTED_FORMATS.contains(f))
}

/// Validate the uploaded bytes
pub fn validate_image(image: &[u8], max_bytes: usize) -> Result<ImageFormat, ClassificationError> {
    if image.is_empty() {
        return Err(ClassificationError::validation("image", "image is required"));
    }
    if image.len() > max_bytes {
        return Err(ClassificationError::validation(
            "image",
            format!(
                "image of {} bytes exceeds maximum size of {} bytes",
                image.len(),
                max_bytes
            ),
        ));
    }
    detect_format(image).ok_or_else(|| {
        ClassificationError::validation(
            "image",
            "unrecognized image format, supported: png, jpeg, webp, gif, bmp",
        )
    })
}

/// Validate per-request options against the configured validity mode
pub fn validate_options(options: &ClassifyOptions, mode: ValidityMode) -> Result<(), ClassificationError> {
    if let Some(threshold) = options.threshold {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ClassificationError::validation(
                "threshold",
                format!("threshold must be between 0 and 1, got {}", threshold),
            ));
        }
        if mode == ValidityMode::ConfidenceAndLabel && options.validated_class.is_none() {
            return Err(ClassificationError::validation(
                "validated_class",
                "validated_class is required with a threshold in confidence-and-label mode",
            ));
        }
    }

    if let Some(ref identifier) = options.image_identifier {
        if identifier.trim().is_empty() {
            return Err(ClassificationError::validation(
                "image_identifier",
                "image_identifier must not be blank",
            ));
        }
    }

    Ok(())
}
