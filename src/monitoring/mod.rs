// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline observability

pub mod pipeline_metrics;

pub use pipeline_metrics::{MappingMiss, PipelineMetrics};
