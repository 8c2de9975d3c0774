// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Label vocabularies and model routing
//!
//! Three read-only lookup components sit between the inference calls:
//! - [`LabelNormalizer`] folds raw ripeness labels into [`CanonicalLabel`]
//! - [`FruitTypeResolver`] turns stage-one detections into a [`FruitKey`]
//! - [`ModelRouter`] picks the stage-two model for a [`FruitKey`]

pub mod fruit;
pub mod normalizer;
pub mod router;
pub mod tables;

pub use fruit::{FruitKey, FruitResolution, FruitTypeResolver, ResolveError};
pub use normalizer::{canonical_key, CanonicalLabel, LabelNormalizer, SynonymTable};
pub use router::{ModelRouter, DEFAULT_RIPENESS_MODEL};
pub use tables::{BuiltTables, LabelTables, TableError};
