// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dashboard aggregation over stored classification records

pub mod engine;

pub use engine::{parse_record_date, AggregationEngine, AggregationSnapshot, LabelCount};
