// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Label and date counts for the dashboard
//!
//! Every call is a full scan of the records handed in; nothing is cached.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::labels::{CanonicalLabel, LabelNormalizer};
use crate::monitoring::{MappingMiss, PipelineMetrics};
use crate::storage::StoredRecord;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Calendar date of a stored timestamp, as written
///
/// Offsets are kept rather than shifted to UTC, so `2024-01-01T23:30:00-05:00`
/// is dated 2024-01-01.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // Postgres text form, e.g. "2024-01-01 10:30:00.123+00"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.date_naive());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: CanonicalLabel,
    pub count: u64,
}

/// Derived summary of a record set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationSnapshot {
    /// Descending by count, ties alphabetical by label name
    pub label_counts: Vec<LabelCount>,
    /// Records per calendar date, ascending
    pub date_counts: BTreeMap<NaiveDate, u64>,
}

impl AggregationSnapshot {
    /// Count for one label, zero when absent
    pub fn label_count(&self, label: CanonicalLabel) -> u64 {
        self.label_counts
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn date_count(&self, date: NaiveDate) -> u64 {
        self.date_counts.get(&date).copied().unwrap_or(0)
    }

    pub fn total_detections(&self) -> u64 {
        self.label_counts.iter().map(|c| c.count).sum()
    }

    pub fn total_records(&self) -> u64 {
        self.date_counts.values().sum()
    }

    /// Each label's proportion of all detections, in `label_counts` order
    pub fn label_share(&self) -> Vec<(CanonicalLabel, f64)> {
        let total = self.total_detections();
        if total == 0 {
            return Vec::new();
        }
        self.label_counts
            .iter()
            .map(|c| (c.label, c.count as f64 / total as f64))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.date_counts.is_empty()
    }
}

/// Computes [`AggregationSnapshot`]s
#[derive(Clone)]
pub struct AggregationEngine {
    normalizer: Arc<LabelNormalizer>,
    metrics: Option<PipelineMetrics>,
}

impl AggregationEngine {
    pub fn new(normalizer: Arc<LabelNormalizer>) -> Self {
        Self {
            normalizer,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Aggregate, dating unparsable timestamps to today (UTC)
    pub fn aggregate(&self, records: &[StoredRecord]) -> AggregationSnapshot {
        self.aggregate_on(records, Utc::now().date_naive())
    }

    /// Aggregate with an explicit "today" for records lacking a usable timestamp
    pub fn aggregate_on(&self, records: &[StoredRecord], today: NaiveDate) -> AggregationSnapshot {
        let mut labels: HashMap<CanonicalLabel, u64> = HashMap::new();
        let mut dates: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        let mut malformed = 0usize;
        let mut undated = 0usize;

        for record in records {
            let date = record
                .timestamp
                .as_deref()
                .and_then(parse_record_date)
                .unwrap_or_else(|| {
                    undated += 1;
                    today
                });
            *dates.entry(date).or_insert(0) += 1;

            if record.malformed {
                malformed += 1;
                continue;
            }

            for detection in record.detections_or_empty() {
                let label = match detection.label.as_deref() {
                    Some(raw) => self.normalize(raw),
                    None => CanonicalLabel::Unknown,
                };
                *labels.entry(label).or_insert(0) += 1;
            }
        }

        let mut label_counts: Vec<LabelCount> = labels
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect();
        label_counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.label.as_str().cmp(b.label.as_str()))
        });

        debug!(
            "Aggregated {} records ({} malformed, {} undated) into {} labels, {} dates",
            records.len(),
            malformed,
            undated,
            label_counts.len(),
            dates.len()
        );
        if let Some(ref metrics) = self.metrics {
            metrics.record_aggregation();
        }

        AggregationSnapshot {
            label_counts,
            date_counts: dates,
        }
    }

    fn normalize(&self, raw: &str) -> CanonicalLabel {
        match self.normalizer.lookup(raw) {
            Some(label) => label,
            None => {
                if let Some(ref metrics) = self.metrics {
                    metrics.record_mapping_miss(&MappingMiss::Label {
                        raw: raw.to_string(),
                    });
                }
                CanonicalLabel::Unknown
            }
        }
    }
}
