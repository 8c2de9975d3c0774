// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Two-stage fruit ripeness classification
//!
//! Key pieces:
//! - [`InferenceProvider`] abstracts the external detection service
//! - [`RoboflowClient`] talks to a hosted detect API over HTTP
//! - [`ClassificationOrchestrator`] runs fruit-type resolution, model routing
//!   and ripeness classification, producing a [`ClassificationRecord`]

pub mod errors;
pub mod mock;
pub mod orchestrator;
pub mod provider;
pub mod roboflow;
pub mod types;
pub mod validation;

pub use errors::{ClassificationError, InferenceError};
pub use mock::MockInferenceProvider;
pub use orchestrator::{ClassificationOrchestrator, PipelineStrategy};
pub use provider::InferenceProvider;
pub use roboflow::RoboflowClient;
pub use types::{
    BoundingBox, ClassificationRecord, ClassifyOptions, Detection, LabeledDetection, Stage,
    ValidityCounts, ValidityMode,
};
