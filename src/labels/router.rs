// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fruit key to ripeness model routing

use std::collections::HashMap;

use super::fruit::FruitKey;
use super::tables::TableError;

pub const DEFAULT_RIPENESS_MODEL: &str = "fruit-ripeness/1";

/// Maps each [`FruitKey`] to the specialized model used for stage two.
///
/// A key without a route falls back to the default model, so `route` always
/// yields a usable identifier.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    routes: HashMap<FruitKey, String>,
    default_model: String,
}

impl ModelRouter {
    /// Router with no explicit routes
    pub fn new(default_model: &str) -> Result<Self, TableError> {
        let default_model = default_model.trim();
        if default_model.is_empty() {
            return Err(TableError::EmptyEntry {
                table: "routes",
                group: FruitKey::Default.as_str().to_string(),
            });
        }
        Ok(Self {
            routes: HashMap::new(),
            default_model: default_model.to_string(),
        })
    }

    /// Router with the built-in per-fruit models
    pub fn with_defaults() -> Self {
        let routes = [
            (FruitKey::Orange, "orange-ripeness/1"),
            (FruitKey::Watermelon, "watermelon-ripeness/1"),
            (FruitKey::Avocado, "avocado-ripeness/1"),
            (FruitKey::Banana, "banana-ripeness/1"),
            (FruitKey::Mango, "mango-ripeness/1"),
        ]
        .into_iter()
        .map(|(k, m)| (k, m.to_string()))
        .collect();

        Self {
            routes,
            default_model: DEFAULT_RIPENESS_MODEL.to_string(),
        }
    }

    /// Set or replace the route for a key
    pub fn set_route(&mut self, key: FruitKey, model_id: &str) -> Result<(), TableError> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(TableError::EmptyEntry {
                table: "routes",
                group: key.as_str().to_string(),
            });
        }
        if key == FruitKey::Default {
            self.default_model = model_id.to_string();
        } else {
            self.routes.insert(key, model_id.to_string());
        }
        Ok(())
    }

    pub fn with_route(mut self, key: FruitKey, model_id: &str) -> Result<Self, TableError> {
        self.set_route(key, model_id)?;
        Ok(self)
    }

    /// Model identifier for a fruit key
    pub fn route(&self, key: FruitKey) -> &str {
        self.route_detailed(key).0
    }

    /// Model identifier plus whether an explicit route matched
    pub fn route_detailed(&self, key: FruitKey) -> (&str, bool) {
        match self.routes.get(&key) {
            Some(model) => (model.as_str(), true),
            None => (self.default_model.as_str(), key == FruitKey::Default),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// All routes in key order, fallback last
    pub fn table(&self) -> Vec<(FruitKey, &str)> {
        FruitKey::ALL.iter().map(|k| (*k, self.route(*k))).collect()
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
