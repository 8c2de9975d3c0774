// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fruit-type resolution from first-stage detections

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::normalizer::canonical_key;
use super::tables::TableError;
use crate::classification::types::Detection;

/// Canonical fruit identifiers used to pick a ripeness model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FruitKey {
    Orange,
    Watermelon,
    Avocado,
    Banana,
    Mango,
    /// Fallback for fruit types the translation table does not know
    Default,
}

impl FruitKey {
    pub const ALL: [FruitKey; 6] = [
        FruitKey::Orange,
        FruitKey::Watermelon,
        FruitKey::Avocado,
        FruitKey::Banana,
        FruitKey::Mango,
        FruitKey::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FruitKey::Orange => "orange",
            FruitKey::Watermelon => "watermelon",
            FruitKey::Avocado => "avocado",
            FruitKey::Banana => "banana",
            FruitKey::Mango => "mango",
            FruitKey::Default => "default",
        }
    }
}

impl fmt::Display for FruitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FruitKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(s);
        FruitKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| format!("unknown fruit key '{}'", s))
    }
}

/// Errors from fruit-type resolution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The fruit-type stage returned nothing to resolve
    #[error("No detections to resolve a fruit type from")]
    NoDetection,
}

/// Outcome of a resolution, with the evidence that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct FruitResolution {
    pub key: FruitKey,
    /// Raw label of the winning detection
    pub source_label: String,
    pub confidence: f32,
    /// False when the label was not in the table and `key` is the fallback
    pub matched: bool,
}

/// Translates generic detector vocabulary into [`FruitKey`]s
#[derive(Debug, Clone)]
pub struct FruitTypeResolver {
    table: HashMap<String, FruitKey>,
    default_key: FruitKey,
}

impl FruitTypeResolver {
    /// Empty table; every label resolves to `default_key`
    pub fn new(default_key: FruitKey) -> Self {
        let mut table = HashMap::new();
        for key in FruitKey::ALL {
            if key != FruitKey::Default {
                table.insert(key.as_str().to_string(), key);
            }
        }
        Self { table, default_key }
    }

    /// Resolver with the built-in translation table
    pub fn with_defaults() -> Self {
        let mut resolver = Self::new(FruitKey::Default);
        let defaults: [(FruitKey, &[&str]); 5] = [
            (FruitKey::Orange, &["orange", "naranja", "mandarin", "tangerine"]),
            (FruitKey::Watermelon, &["watermelon", "sandia"]),
            (FruitKey::Avocado, &["avocado", "palta", "aguacate"]),
            (FruitKey::Banana, &["banana", "platano"]),
            (FruitKey::Mango, &["mango"]),
        ];
        for (key, labels) in defaults {
            for label in labels {
                resolver.table.insert(canonical_key(label), key);
            }
        }
        resolver
    }

    /// Register an extra generic label for a fruit key
    pub fn add_translation(&mut self, label: &str, key: FruitKey) -> Result<(), TableError> {
        let folded = canonical_key(label);
        if folded.is_empty() {
            return Err(TableError::EmptyEntry {
                table: "fruit_types",
                group: key.as_str().to_string(),
            });
        }
        if let Some(existing) = self.table.get(&folded) {
            if *existing != key {
                return Err(TableError::ConflictingSynonym {
                    synonym: folded,
                    first: existing.as_str().to_string(),
                    second: key.as_str().to_string(),
                });
            }
        }
        self.table.insert(folded, key);
        Ok(())
    }

    pub fn default_key(&self) -> FruitKey {
        self.default_key
    }

    /// Case-insensitive table lookup for a single raw label
    pub fn translate(&self, raw_label: &str) -> Option<FruitKey> {
        self.table.get(&canonical_key(raw_label)).copied()
    }

    /// Resolve the fruit key of the highest-confidence detection
    pub fn resolve(&self, detections: &[Detection]) -> Result<FruitKey, ResolveError> {
        self.resolve_detailed(detections).map(|r| r.key)
    }

    /// Like [`resolve`](Self::resolve), also returning the winning evidence.
    /// The first detection wins on equal confidence.
    pub fn resolve_detailed(&self, detections: &[Detection]) -> Result<FruitResolution, ResolveError> {
        let winner = detections
            .iter()
            .reduce(|best, d| if d.confidence > best.confidence { d } else { best })
            .ok_or(ResolveError::NoDetection)?;

        let (key, matched) = match self.translate(&winner.label) {
            Some(key) => (key, true),
            None => (self.default_key, false),
        };

        Ok(FruitResolution {
            key,
            source_label: winner.label.clone(),
            confidence: winner.confidence,
            matched,
        })
    }
}

impl Default for FruitTypeResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}
