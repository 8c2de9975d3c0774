// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline configuration

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::classification::{
    ClassificationOrchestrator, InferenceError, InferenceProvider, PipelineStrategy, RoboflowClient,
    ValidityMode,
};
use crate::classification::validation::DEFAULT_MAX_IMAGE_BYTES;
use crate::labels::{BuiltTables, FruitKey, LabelTables, TableError, DEFAULT_RIPENESS_MODEL};
use crate::monitoring::PipelineMetrics;
use crate::storage::{
    supabase, InMemoryRecordStore, PersistenceError, RecordStore, SupabaseRecordStore,
};

pub const DEFAULT_INFERENCE_ENDPOINT: &str = "https://detect.roboflow.com";
pub const DEFAULT_FRUIT_TYPE_MODEL: &str = "fruit-type-detection/1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Errors wiring components from configuration
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Tables(#[from] TableError),

    #[error("Inference client setup failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Record store setup failed: {0}")]
    Store(#[from] PersistenceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineMode {
    #[default]
    TwoStage,
    SingleStage,
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::TwoStage => f.write_str("two-stage"),
            PipelineMode::SingleStage => f.write_str("single-stage"),
        }
    }
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "two-stage" | "two" => Ok(PipelineMode::TwoStage),
            "single-stage" | "single" => Ok(PipelineMode::SingleStage),
            other => Err(format!(
                "unknown pipeline mode '{}', expected two-stage or single-stage",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Supabase,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => f.write_str("memory"),
            StorageBackend::Supabase => f.write_str("supabase"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "supabase" => Ok(StorageBackend::Supabase),
            other => Err(format!(
                "unknown storage backend '{}', expected memory or supabase",
                other
            )),
        }
    }
}

/// Configuration for the classification pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the detection API
    pub inference_endpoint: String,
    pub inference_api_key: Option<String>,
    /// Per-call timeout for inference and store requests
    pub timeout_ms: u64,
    /// Generic fruit-type model (two-stage only)
    pub fruit_type_model: String,
    /// Fallback ripeness model for fruit keys without a route
    pub default_ripeness_model: String,
    pub mode: PipelineMode,
    /// Fruit key stamped on single-stage records
    pub single_stage_fruit: FruitKey,
    /// Substituted when stage one detects nothing; unset makes that fatal
    pub default_fruit: Option<FruitKey>,
    pub validity_mode: ValidityMode,
    pub max_image_bytes: usize,
    pub storage: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_table: String,
    /// Optional TOML file extending the label tables
    pub label_tables_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            inference_endpoint: var("INFERENCE_ENDPOINT").unwrap_or(defaults.inference_endpoint),
            inference_api_key: var("INFERENCE_API_KEY"),
            timeout_ms: parse_or("INFERENCE_TIMEOUT_MS", var("INFERENCE_TIMEOUT_MS"), defaults.timeout_ms),
            fruit_type_model: var("FRUIT_TYPE_MODEL").unwrap_or(defaults.fruit_type_model),
            default_ripeness_model: var("DEFAULT_RIPENESS_MODEL")
                .unwrap_or(defaults.default_ripeness_model),
            mode: parse_or("PIPELINE_MODE", var("PIPELINE_MODE"), defaults.mode),
            single_stage_fruit: parse_or(
                "SINGLE_STAGE_FRUIT",
                var("SINGLE_STAGE_FRUIT"),
                defaults.single_stage_fruit,
            ),
            default_fruit: var("DEFAULT_FRUIT_KEY").and_then(|v| match v.parse() {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!("Ignoring DEFAULT_FRUIT_KEY: {}", e);
                    None
                }
            }),
            validity_mode: parse_or("VALIDITY_MODE", var("VALIDITY_MODE"), defaults.validity_mode),
            max_image_bytes: parse_or("MAX_IMAGE_BYTES", var("MAX_IMAGE_BYTES"), defaults.max_image_bytes),
            storage: parse_or("STORAGE_BACKEND", var("STORAGE_BACKEND"), defaults.storage),
            supabase_url: var("SUPABASE_URL"),
            supabase_key: var("SUPABASE_KEY"),
            supabase_table: var("SUPABASE_TABLE").unwrap_or(defaults.supabase_table),
            label_tables_path: var("LABEL_TABLES_PATH").map(PathBuf::from),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.inference_endpoint)
            .map_err(|e| format!("INFERENCE_ENDPOINT is not a valid URL: {}", e))?;
        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        if self.mode == PipelineMode::TwoStage && self.fruit_type_model.trim().is_empty() {
            return Err("Fruit-type model must not be empty in two-stage mode".to_string());
        }
        if self.default_ripeness_model.trim().is_empty() {
            return Err("Default ripeness model must not be empty".to_string());
        }
        if self.max_image_bytes == 0 {
            return Err("Max image size must be greater than 0".to_string());
        }
        if self.storage == StorageBackend::Supabase {
            let url = self
                .supabase_url
                .as_deref()
                .ok_or("SUPABASE_URL is required for the supabase backend")?;
            Url::parse(url).map_err(|e| format!("SUPABASE_URL is not a valid URL: {}", e))?;
            if self.supabase_key.is_none() {
                return Err("SUPABASE_KEY is required for the supabase backend".to_string());
            }
            if self.supabase_table.trim().is_empty() {
                return Err("Supabase table must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Whether stored records outlive this process
    pub fn is_persistent(&self) -> bool {
        self.storage != StorageBackend::Memory
    }

    /// Built-in tables merged with the optional TOML overrides
    pub fn load_tables(&self) -> Result<BuiltTables, TableError> {
        let overrides = match self.label_tables_path {
            Some(ref path) => {
                info!("Loading label tables from {}", path.display());
                LabelTables::load(path)?
            }
            None => LabelTables::default(),
        };
        overrides.build(&self.default_ripeness_model)
    }

    /// Strategy for the configured mode; single-stage uses the routed model
    pub fn strategy(&self, tables: &BuiltTables) -> PipelineStrategy {
        match self.mode {
            PipelineMode::TwoStage => PipelineStrategy::TwoStage {
                fruit_type_model: self.fruit_type_model.clone(),
                default_fruit: self.default_fruit,
            },
            PipelineMode::SingleStage => PipelineStrategy::single_stage(
                tables.router.route(self.single_stage_fruit),
                self.single_stage_fruit,
            ),
        }
    }

    pub fn build_provider(&self) -> Result<Arc<dyn InferenceProvider>, InferenceError> {
        let client = RoboflowClient::new(
            &self.inference_endpoint,
            self.inference_api_key.clone(),
            self.timeout_ms,
        )?;
        Ok(Arc::new(client))
    }

    pub fn build_store(&self) -> Result<Arc<dyn RecordStore>, PersistenceError> {
        match self.storage {
            StorageBackend::Memory => Ok(Arc::new(InMemoryRecordStore::new())),
            StorageBackend::Supabase => {
                let url = self.supabase_url.as_deref().ok_or_else(|| {
                    PersistenceError::Transport("SUPABASE_URL is not set".to_string())
                })?;
                let key = self.supabase_key.as_deref().ok_or_else(|| {
                    PersistenceError::Transport("SUPABASE_KEY is not set".to_string())
                })?;
                Ok(Arc::new(SupabaseRecordStore::new(
                    url,
                    key,
                    &self.supabase_table,
                    self.timeout_ms,
                )?))
            }
        }
    }

    /// Orchestrator over `provider` with the configured tables and variant
    pub fn build_orchestrator(
        &self,
        provider: Arc<dyn InferenceProvider>,
        metrics: PipelineMetrics,
    ) -> Result<ClassificationOrchestrator, SetupError> {
        self.validate().map_err(SetupError::Invalid)?;
        let tables = self.load_tables()?;
        let strategy = self.strategy(&tables);
        Ok(ClassificationOrchestrator::new(provider, tables, strategy)
            .with_validity_mode(self.validity_mode)
            .with_max_image_bytes(self.max_image_bytes)
            .with_metrics(metrics))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference_endpoint: DEFAULT_INFERENCE_ENDPOINT.to_string(),
            inference_api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fruit_type_model: DEFAULT_FRUIT_TYPE_MODEL.to_string(),
            default_ripeness_model: DEFAULT_RIPENESS_MODEL.to_string(),
            mode: PipelineMode::TwoStage,
            single_stage_fruit: FruitKey::Default,
            default_fruit: None,
            validity_mode: ValidityMode::ConfidenceOnly,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            storage: StorageBackend::Memory,
            supabase_url: None,
            supabase_key: None,
            supabase_table: supabase::DEFAULT_TABLE.to_string(),
            label_tables_path: None,
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring {}='{}': {}", key, raw, e);
                default
            }
        },
        None => default,
    }
}
