// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod aggregation;
pub mod classification;
pub mod cli;
pub mod config;
pub mod labels;
pub mod monitoring;
pub mod service;
pub mod storage;
pub mod version;

// Re-export main types
pub use aggregation::{AggregationEngine, AggregationSnapshot, LabelCount};
pub use classification::{
    ClassificationError, ClassificationOrchestrator, ClassificationRecord, ClassifyOptions,
    Detection, InferenceError, InferenceProvider, PipelineStrategy, ValidityMode,
};
pub use config::{PipelineConfig, SetupError};
pub use labels::{CanonicalLabel, FruitKey, LabelNormalizer, ModelRouter};
pub use monitoring::{MappingMiss, PipelineMetrics};
pub use service::{PipelineService, StoredClassification};
pub use storage::{InMemoryRecordStore, PersistenceError, RecordStore, StoredRecord, SupabaseRecordStore};
