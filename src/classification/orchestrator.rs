// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification orchestration
//!
//! Drives the fruit-type call, resolution, routing, the ripeness call and
//! label normalization, and assembles the [`ClassificationRecord`]. The
//! orchestrator never persists; see [`crate::service::PipelineService`].

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{ClassificationError, InferenceError};
use super::provider::InferenceProvider;
use super::types::{
    ClassificationRecord, ClassifyOptions, Detection, LabeledDetection, Stage, ValidityCounts,
    ValidityMode,
};
use super::validation::{validate_image, validate_options, DEFAULT_MAX_IMAGE_BYTES};
use crate::labels::{
    BuiltTables, FruitKey, FruitTypeResolver, LabelNormalizer, ModelRouter, ResolveError,
};
use crate::monitoring::{MappingMiss, PipelineMetrics};

/// Which pipeline variant runs, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStrategy {
    /// Generic fruit-type model first, then the routed ripeness model
    TwoStage {
        fruit_type_model: String,
        /// Substituted when stage one detects nothing; `None` makes that fatal
        default_fruit: Option<FruitKey>,
    },
    /// One call to a fixed model, stamped with a fixed fruit key
    SingleStage { model: String, fruit_type: FruitKey },
}

impl PipelineStrategy {
    pub fn two_stage(fruit_type_model: &str) -> Self {
        PipelineStrategy::TwoStage {
            fruit_type_model: fruit_type_model.to_string(),
            default_fruit: None,
        }
    }

    pub fn single_stage(model: &str, fruit_type: FruitKey) -> Self {
        PipelineStrategy::SingleStage {
            model: model.to_string(),
            fruit_type,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineStrategy::TwoStage { .. } => "two-stage",
            PipelineStrategy::SingleStage { .. } => "single-stage",
        }
    }
}

/// Classification orchestrator
pub struct ClassificationOrchestrator {
    provider: Arc<dyn InferenceProvider>,
    normalizer: Arc<LabelNormalizer>,
    resolver: Arc<FruitTypeResolver>,
    router: Arc<ModelRouter>,
    strategy: PipelineStrategy,
    validity_mode: ValidityMode,
    max_image_bytes: usize,
    metrics: PipelineMetrics,
}

impl ClassificationOrchestrator {
    /// Create an orchestrator over built lookup tables
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        tables: BuiltTables,
        strategy: PipelineStrategy,
    ) -> Self {
        info!(
            "Classification orchestrator: strategy={}, provider={}",
            strategy.name(),
            provider.name()
        );
        Self {
            provider,
            normalizer: Arc::new(tables.normalizer),
            resolver: Arc::new(tables.resolver),
            router: Arc::new(tables.router),
            strategy,
            validity_mode: ValidityMode::default(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn with_validity_mode(mut self, mode: ValidityMode) -> Self {
        self.validity_mode = mode;
        self
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    /// Share a metrics sink with other components
    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn strategy(&self) -> &PipelineStrategy {
        &self.strategy
    }

    pub fn validity_mode(&self) -> ValidityMode {
        self.validity_mode
    }

    pub fn normalizer(&self) -> Arc<LabelNormalizer> {
        Arc::clone(&self.normalizer)
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Classify one image
    ///
    /// # Arguments
    /// * `image` - Uploaded image bytes
    /// * `options` - Threshold, expected class, identifier and timestamp
    ///
    /// # Returns
    /// The assembled record, or a typed error. Zero ripeness detections is a
    /// successful, empty record.
    pub async fn classify(
        &self,
        image: &[u8],
        options: ClassifyOptions,
    ) -> Result<ClassificationRecord, ClassificationError> {
        self.metrics.record_classification_attempt();
        let start = Instant::now();

        match self.classify_inner(image, options).await {
            Ok(record) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                self.metrics.record_classification_success(elapsed_ms);
                info!(
                    "Classified {} as {} with {} detections via {} in {}ms",
                    record.image_identifier,
                    record.fruit_type,
                    record.detections.len(),
                    record.model_used,
                    elapsed_ms
                );
                Ok(record)
            }
            Err(e) => {
                match &e {
                    ClassificationError::ExternalService { .. } => {
                        self.metrics.record_external_service_error()
                    }
                    ClassificationError::NoDetection { .. } => self.metrics.record_no_detection(),
                    ClassificationError::Validation { .. } => {
                        self.metrics.record_validation_error()
                    }
                    ClassificationError::Persistence(_) => self.metrics.record_persistence_error(),
                }
                warn!("Classification failed ({}): {}", e.kind(), e);
                Err(e)
            }
        }
    }

    async fn classify_inner(
        &self,
        image: &[u8],
        options: ClassifyOptions,
    ) -> Result<ClassificationRecord, ClassificationError> {
        let format = validate_image(image, self.max_image_bytes)?;
        validate_options(&options, self.validity_mode)?;
        debug!("Accepted {:?} image of {} bytes", format, image.len());

        let (fruit_type, model) = match &self.strategy {
            PipelineStrategy::TwoStage {
                fruit_type_model,
                default_fruit,
            } => {
                let stage_one = self.run_stage(Stage::FruitType, image, fruit_type_model).await?;
                let fruit_type = self.resolve_fruit(&stage_one, fruit_type_model, *default_fruit)?;
                let (model, matched) = self.router.route_detailed(fruit_type);
                if !matched {
                    self.metrics
                        .record_mapping_miss(&MappingMiss::Route { key: fruit_type });
                }
                (fruit_type, model.to_string())
            }
            PipelineStrategy::SingleStage { model, fruit_type } => (*fruit_type, model.clone()),
        };

        let raw = self.run_stage(Stage::Ripeness, image, &model).await?;
        let detections = self.normalize_all(&raw);

        let (valid_count, invalid_count) = match options.threshold {
            Some(threshold) => {
                let counts = ValidityCounts::compute(
                    &detections,
                    threshold,
                    self.validity_mode,
                    options.validated_class,
                );
                (Some(counts.valid), Some(counts.invalid))
            }
            None => (None, None),
        };

        Ok(ClassificationRecord {
            timestamp: options.timestamp.unwrap_or_else(Utc::now),
            image_identifier: options
                .image_identifier
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            fruit_type,
            model_used: model,
            detections,
            validated_class: options.validated_class,
            threshold: options.threshold,
            valid_count,
            invalid_count,
        })
    }

    /// One inference call; exactly one attempt
    async fn run_stage(
        &self,
        stage: Stage,
        image: &[u8],
        model: &str,
    ) -> Result<Vec<Detection>, ClassificationError> {
        let start = Instant::now();
        debug!("Running {} stage on model {}", stage, model);

        let detections = self
            .provider
            .infer(image, model)
            .await
            .map_err(|source| ClassificationError::ExternalService {
                stage,
                model: model.to_string(),
                source,
            })?;

        for detection in &detections {
            detection
                .validate()
                .map_err(|message| ClassificationError::ExternalService {
                    stage,
                    model: model.to_string(),
                    source: InferenceError::MalformedResponse(message),
                })?;
        }

        debug!(
            "{} stage on {} returned {} detections in {}ms",
            stage,
            model,
            detections.len(),
            start.elapsed().as_millis()
        );
        Ok(detections)
    }

    fn resolve_fruit(
        &self,
        stage_one: &[Detection],
        model: &str,
        default_fruit: Option<FruitKey>,
    ) -> Result<FruitKey, ClassificationError> {
        match self.resolver.resolve_detailed(stage_one) {
            Ok(resolution) => {
                if !resolution.matched {
                    self.metrics.record_mapping_miss(&MappingMiss::FruitType {
                        raw: resolution.source_label.clone(),
                    });
                }
                debug!(
                    "Resolved fruit type {} from '{}' ({:.2})",
                    resolution.key, resolution.source_label, resolution.confidence
                );
                Ok(resolution.key)
            }
            Err(ResolveError::NoDetection) => match default_fruit {
                Some(key) => {
                    self.metrics.record_default_fruit_substitution();
                    warn!("No fruit detected by {}, using default key {}", model, key);
                    Ok(key)
                }
                None => Err(ClassificationError::NoDetection {
                    model: model.to_string(),
                }),
            },
        }
    }

    fn normalize_all(&self, raw: &[Detection]) -> Vec<LabeledDetection> {
        raw.iter()
            .map(|detection| {
                if self.normalizer.lookup(&detection.label).is_none() {
                    self.metrics.record_mapping_miss(&MappingMiss::Label {
                        raw: detection.label.clone(),
                    });
                }
                detection.normalized(&self.normalizer)
            })
            .collect()
    }
}
