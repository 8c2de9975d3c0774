// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deployment overrides for the synonym, translation and routing tables
//!
//! Tables are loaded once at startup and never mutated afterwards; the built
//! normalizer, resolver and router are shared read-only across requests.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::fruit::{FruitKey, FruitTypeResolver};
use super::normalizer::{CanonicalLabel, LabelNormalizer, SynonymTable};
use super::router::ModelRouter;

/// Errors from building or loading lookup tables
#[derive(Debug, Error)]
pub enum TableError {
    /// The same entry was bound to two different targets
    #[error("'{synonym}' is listed under both '{first}' and '{second}'")]
    ConflictingSynonym {
        synonym: String,
        first: String,
        second: String,
    },

    /// A blank synonym or model identifier
    #[error("Empty entry in {table} table for '{group}'")]
    EmptyEntry { table: &'static str, group: String },

    /// A group name that is not a canonical label or fruit key
    #[error("Unknown {table} group '{name}'")]
    UnknownGroup { table: &'static str, name: String },

    #[error("Failed to read table file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse table file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Table overrides as read from TOML
///
/// ```toml
/// [synonyms]
/// ripe = ["listo"]
///
/// [fruit_types]
/// orange = ["clementine"]
///
/// [routes]
/// orange = "orange-ripeness/3"
/// default = "fruit-ripeness/2"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelTables {
    /// Extra synonyms keyed by canonical label name
    pub synonyms: BTreeMap<String, Vec<String>>,
    /// Extra generic-detector labels keyed by fruit key
    pub fruit_types: BTreeMap<String, Vec<String>>,
    /// Model identifier per fruit key; `default` replaces the fallback
    pub routes: BTreeMap<String, String>,
}

/// The three built lookup components
#[derive(Debug, Clone)]
pub struct BuiltTables {
    pub normalizer: LabelNormalizer,
    pub resolver: FruitTypeResolver,
    pub router: ModelRouter,
}

impl LabelTables {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load overrides from a TOML file
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| TableError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.synonyms.is_empty() && self.fruit_types.is_empty() && self.routes.is_empty()
    }

    /// Merge the overrides into the built-in tables
    pub fn build(&self, default_model: &str) -> Result<BuiltTables, TableError> {
        let mut synonyms = SynonymTable::default();
        for (name, entries) in &self.synonyms {
            let label: CanonicalLabel = name.parse().map_err(|_| TableError::UnknownGroup {
                table: "synonyms",
                name: name.clone(),
            })?;
            synonyms.extend_group(label, entries.iter().cloned());
        }
        let normalizer = LabelNormalizer::new(&synonyms)?;

        let mut resolver = FruitTypeResolver::with_defaults();
        for (name, labels) in &self.fruit_types {
            let key = parse_fruit_group("fruit_types", name)?;
            for label in labels {
                resolver.add_translation(label, key)?;
            }
        }

        let mut router = ModelRouter::with_defaults();
        router.set_route(FruitKey::Default, default_model)?;
        for (name, model) in &self.routes {
            let key = parse_fruit_group("routes", name)?;
            router.set_route(key, model)?;
        }

        Ok(BuiltTables {
            normalizer,
            resolver,
            router,
        })
    }
}

fn parse_fruit_group(table: &'static str, name: &str) -> Result<FruitKey, TableError> {
    name.parse().map_err(|_| TableError::UnknownGroup {
        table,
        name: name.to_string(),
    })
}
