// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification plus persistence, and the dashboard read path

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::aggregation::{AggregationEngine, AggregationSnapshot};
use crate::classification::{ClassificationError, ClassificationOrchestrator, ClassificationRecord, ClassifyOptions};
use crate::config::{PipelineConfig, SetupError};
use crate::monitoring::PipelineMetrics;
use crate::storage::{PersistenceError, RecordStore};

/// A classification that has been written to the store
#[derive(Debug, Clone, Serialize)]
pub struct StoredClassification {
    pub record_id: String,
    pub record: ClassificationRecord,
}

/// Orchestrator, store and aggregation wired together
#[derive(Clone)]
pub struct PipelineService {
    orchestrator: Arc<ClassificationOrchestrator>,
    store: Arc<dyn RecordStore>,
    aggregator: AggregationEngine,
    metrics: PipelineMetrics,
}

impl PipelineService {
    /// Aggregation shares the orchestrator's normalizer and metrics
    pub fn new(orchestrator: Arc<ClassificationOrchestrator>, store: Arc<dyn RecordStore>) -> Self {
        let metrics = orchestrator.metrics().clone();
        let aggregator =
            AggregationEngine::new(orchestrator.normalizer()).with_metrics(metrics.clone());
        info!(
            "Pipeline service ready: strategy={}, store={}",
            orchestrator.strategy().name(),
            store.name()
        );
        Self {
            orchestrator,
            store,
            aggregator,
            metrics,
        }
    }

    /// Build every component from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, SetupError> {
        let provider = config.build_provider()?;
        let store = config.build_store()?;
        let orchestrator = config.build_orchestrator(provider, PipelineMetrics::new())?;
        Ok(Self::new(Arc::new(orchestrator), store))
    }

    pub fn orchestrator(&self) -> &ClassificationOrchestrator {
        &self.orchestrator
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Classify an image and persist the record
    ///
    /// A store failure after a successful classification is returned as
    /// [`ClassificationError::Persistence`]; nothing is reported as saved
    /// unless the store confirmed it.
    pub async fn classify_and_store(
        &self,
        image: &[u8],
        options: ClassifyOptions,
    ) -> Result<StoredClassification, ClassificationError> {
        let record = self.orchestrator.classify(image, options).await?;
        let record_id = Uuid::new_v4().to_string();

        if let Err(e) = self.store.insert(&record_id, &record).await {
            self.metrics.record_persistence_error();
            error!(
                "Failed to persist record {} for {}: {}",
                record_id, record.image_identifier, e
            );
            return Err(ClassificationError::Persistence(e));
        }

        self.metrics.record_persisted();
        info!("Persisted record {} to {}", record_id, self.store.name());
        Ok(StoredClassification { record_id, record })
    }

    /// Read every stored record and aggregate it
    pub async fn dashboard(&self) -> Result<AggregationSnapshot, PersistenceError> {
        let records = self.store.select_all().await?;
        Ok(self.aggregator.aggregate(&records))
    }

    /// [`dashboard`](Self::dashboard) with an explicit date for undated records
    pub async fn dashboard_on(&self, today: NaiveDate) -> Result<AggregationSnapshot, PersistenceError> {
        let records = self.store.select_all().await?;
        Ok(self.aggregator.aggregate_on(&records, today))
    }
}
