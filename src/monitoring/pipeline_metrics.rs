// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline Prometheus Metrics
//!
//! Counters for classification outcomes, table mapping misses, persistence
//! and aggregation. Lock-free; clone freely, clones share the counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::labels::FruitKey;

/// A table lookup that fell back to a default instead of matching
///
/// Never an error; recorded for observability only.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingMiss {
    /// Ripeness label not in the synonym table, normalized to `unknown`
    Label { raw: String },
    /// Fruit-type label not in the translation table, resolved to the default key
    FruitType { raw: String },
    /// Fruit key without an explicit route, sent to the default model
    Route { key: FruitKey },
}

impl fmt::Display for MappingMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingMiss::Label { raw } => write!(f, "label '{}' -> unknown", raw),
            MappingMiss::FruitType { raw } => write!(f, "fruit type '{}' -> default", raw),
            MappingMiss::Route { key } => write!(f, "route for '{}' -> default model", key),
        }
    }
}

/// Pipeline metrics for Prometheus
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    classifications_total: Arc<AtomicU64>,
    classifications_success: Arc<AtomicU64>,
    external_service_errors: Arc<AtomicU64>,
    no_detection_errors: Arc<AtomicU64>,
    validation_errors: Arc<AtomicU64>,
    persistence_errors: Arc<AtomicU64>,
    default_fruit_substitutions: Arc<AtomicU64>,
    label_mapping_misses: Arc<AtomicU64>,
    fruit_mapping_misses: Arc<AtomicU64>,
    route_mapping_misses: Arc<AtomicU64>,
    records_persisted: Arc<AtomicU64>,
    aggregations_total: Arc<AtomicU64>,
    /// Total classification time in milliseconds
    classification_duration_ms: Arc<AtomicU64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_classification_attempt(&self) {
        self.classifications_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification_success(&self, duration_ms: u64) {
        self.classifications_success.fetch_add(1, Ordering::Relaxed);
        self.classification_duration_ms
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_external_service_error(&self) {
        self.external_service_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_detection(&self) {
        self.no_detection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_error(&self) {
        self.persistence_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_default_fruit_substitution(&self) {
        self.default_fruit_substitutions
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.records_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_aggregation(&self) {
        self.aggregations_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a mapping miss and log it
    pub fn record_mapping_miss(&self, miss: &MappingMiss) {
        match miss {
            MappingMiss::Label { .. } => {
                debug!("Mapping miss: {}", miss);
                self.label_mapping_misses.fetch_add(1, Ordering::Relaxed);
            }
            MappingMiss::FruitType { .. } => {
                warn!("Mapping miss: {}", miss);
                self.fruit_mapping_misses.fetch_add(1, Ordering::Relaxed);
            }
            MappingMiss::Route { .. } => {
                warn!("Mapping miss: {}", miss);
                self.route_mapping_misses.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    // Getters

    pub fn classifications_total(&self) -> u64 {
        self.classifications_total.load(Ordering::Relaxed)
    }

    pub fn classifications_success(&self) -> u64 {
        self.classifications_success.load(Ordering::Relaxed)
    }

    pub fn external_service_errors(&self) -> u64 {
        self.external_service_errors.load(Ordering::Relaxed)
    }

    pub fn no_detection_errors(&self) -> u64 {
        self.no_detection_errors.load(Ordering::Relaxed)
    }

    pub fn validation_errors(&self) -> u64 {
        self.validation_errors.load(Ordering::Relaxed)
    }

    pub fn persistence_errors(&self) -> u64 {
        self.persistence_errors.load(Ordering::Relaxed)
    }

    pub fn default_fruit_substitutions(&self) -> u64 {
        self.default_fruit_substitutions.load(Ordering::Relaxed)
    }

    pub fn label_mapping_misses(&self) -> u64 {
        self.label_mapping_misses.load(Ordering::Relaxed)
    }

    pub fn fruit_mapping_misses(&self) -> u64 {
        self.fruit_mapping_misses.load(Ordering::Relaxed)
    }

    pub fn route_mapping_misses(&self) -> u64 {
        self.route_mapping_misses.load(Ordering::Relaxed)
    }

    pub fn records_persisted(&self) -> u64 {
        self.records_persisted.load(Ordering::Relaxed)
    }

    pub fn aggregations_total(&self) -> u64 {
        self.aggregations_total.load(Ordering::Relaxed)
    }

    /// Average successful classification time in milliseconds
    pub fn avg_classification_ms(&self) -> f64 {
        let count = self.classifications_success();
        if count == 0 {
            return 0.0;
        }
        self.classification_duration_ms.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        format!(
            r#"# HELP ripeness_classifications_total Total number of classification requests
# TYPE ripeness_classifications_total counter
ripeness_classifications_total {}

# HELP ripeness_classifications_success Number of successful classifications
# TYPE ripeness_classifications_success counter
ripeness_classifications_success {}

# HELP ripeness_classification_errors Classification failures by kind
# TYPE ripeness_classification_errors counter
ripeness_classification_errors{{kind="external_service"}} {}
ripeness_classification_errors{{kind="no_detection"}} {}
ripeness_classification_errors{{kind="validation"}} {}
ripeness_classification_errors{{kind="persistence"}} {}

# HELP ripeness_default_fruit_substitutions Empty fruit-type results replaced by the default key
# TYPE ripeness_default_fruit_substitutions counter
ripeness_default_fruit_substitutions {}

# HELP ripeness_mapping_misses Table lookups that fell back to a default
# TYPE ripeness_mapping_misses counter
ripeness_mapping_misses{{table="label"}} {}
ripeness_mapping_misses{{table="fruit_type"}} {}
ripeness_mapping_misses{{table="route"}} {}

# HELP ripeness_records_persisted Records written to the store
# TYPE ripeness_records_persisted counter
ripeness_records_persisted {}

# HELP ripeness_aggregations_total Dashboard aggregations computed
# TYPE ripeness_aggregations_total counter
ripeness_aggregations_total {}

# HELP ripeness_classification_avg_ms Average classification time in milliseconds
# TYPE ripeness_classification_avg_ms gauge
ripeness_classification_avg_ms {:.2}
"#,
            self.classifications_total(),
            self.classifications_success(),
            self.external_service_errors(),
            self.no_detection_errors(),
            self.validation_errors(),
            self.persistence_errors(),
            self.default_fruit_substitutions(),
            self.label_mapping_misses(),
            self.fruit_mapping_misses(),
            self.route_mapping_misses(),
            self.records_persisted(),
            self.aggregations_total(),
            self.avg_classification_ms(),
        )
    }
}
