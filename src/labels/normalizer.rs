// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ripeness label normalization
//!
//! Different ripeness models disagree on vocabulary ("ripen", "green",
//! "too-ripe", ...). The normalizer folds every raw class string into the
//! closed [`CanonicalLabel`] set. Lookup is total: anything not in the
//! synonym table becomes [`CanonicalLabel::Unknown`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::tables::TableError;

/// Closed set of ripeness categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalLabel {
    Unripe,
    Ripe,
    Overripe,
    Unknown,
}

impl CanonicalLabel {
    /// Every canonical label, `Unknown` last
    pub const ALL: [CanonicalLabel; 4] = [
        CanonicalLabel::Unripe,
        CanonicalLabel::Ripe,
        CanonicalLabel::Overripe,
        CanonicalLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalLabel::Unripe => "unripe",
            CanonicalLabel::Ripe => "ripe",
            CanonicalLabel::Overripe => "overripe",
            CanonicalLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalLabel {
    type Err = String;

    /// Parses only the exact canonical names (case-insensitive).
    /// Use [`LabelNormalizer::normalize`] for free-form model output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = canonical_key(s);
        CanonicalLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == key)
            .ok_or_else(|| {
                format!(
                    "unknown label '{}', expected one of: unripe, ripe, overripe, unknown",
                    s
                )
            })
    }
}

/// Folds a raw string into its lookup form: trimmed, lowercase, with runs of
/// whitespace, `_` and `-` collapsed into a single `-`.
pub fn canonical_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash && !key.is_empty() {
            key.push('-');
        }
        pending_dash = false;
        key.extend(ch.to_lowercase());
    }
    key
}

/// Synonym groups keyed by canonical label
#[derive(Debug, Clone)]
pub struct SynonymTable {
    groups: Vec<(CanonicalLabel, Vec<String>)>,
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Adds synonyms to a label's group, creating the group if needed
    pub fn with_group<I, S>(mut self, label: CanonicalLabel, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_group(label, synonyms);
        self
    }

    pub fn extend_group<I, S>(&mut self, label: CanonicalLabel, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let synonyms = synonyms.into_iter().map(Into::into);
        match self.groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, group)) => group.extend(synonyms),
            None => self.groups.push((label, synonyms.collect())),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = (CanonicalLabel, &[String])> {
        self.groups.iter().map(|(l, g)| (*l, g.as_slice()))
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::empty()
            .with_group(
                CanonicalLabel::Unripe,
                ["unripe", "unripen", "green", "immature", "verde", "inmaduro"],
            )
            .with_group(
                CanonicalLabel::Ripe,
                ["ripe", "ripen", "ripe-orange", "mature", "maduro"],
            )
            .with_group(
                CanonicalLabel::Overripe,
                ["overripe", "too-ripe", "rotten", "podrido", "sobremaduro"],
            )
    }
}

/// Canonicalizes raw model labels against an immutable synonym table
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    lookup: HashMap<String, CanonicalLabel>,
}

impl LabelNormalizer {
    /// Build a normalizer from a synonym table.
    ///
    /// Canonical names are always present and map to themselves, so feeding a
    /// normalized label back in returns the same label. A synonym listed under
    /// two different labels is rejected.
    pub fn new(table: &SynonymTable) -> Result<Self, TableError> {
        let mut lookup = HashMap::new();
        for label in CanonicalLabel::ALL {
            lookup.insert(label.as_str().to_string(), label);
        }

        for (label, synonyms) in table.groups() {
            for synonym in synonyms {
                let key = canonical_key(synonym);
                if key.is_empty() {
                    return Err(TableError::EmptyEntry {
                        table: "synonyms",
                        group: label.as_str().to_string(),
                    });
                }
                match lookup.get(&key) {
                    Some(existing) if *existing != label => {
                        return Err(TableError::ConflictingSynonym {
                            synonym: key,
                            first: existing.as_str().to_string(),
                            second: label.as_str().to_string(),
                        });
                    }
                    _ => {
                        lookup.insert(key, label);
                    }
                }
            }
        }

        Ok(Self { lookup })
    }

    /// Normalizer over [`SynonymTable::default`]
    pub fn with_defaults() -> Self {
        let mut lookup = HashMap::new();
        for label in CanonicalLabel::ALL {
            lookup.insert(label.as_str().to_string(), label);
        }
        for (label, synonyms) in SynonymTable::default().groups() {
            for synonym in synonyms {
                lookup.insert(canonical_key(synonym), label);
            }
        }
        Self { lookup }
    }

    /// Map a raw label to its canonical label, `Unknown` on a miss
    pub fn normalize(&self, raw: &str) -> CanonicalLabel {
        self.lookup(raw).unwrap_or(CanonicalLabel::Unknown)
    }

    /// Like [`normalize`](Self::normalize) but reports a miss as `None`
    pub fn lookup(&self, raw: &str) -> Option<CanonicalLabel> {
        self.lookup.get(&canonical_key(raw)).copied()
    }

    /// Number of distinct lookup keys
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::with_defaults()
    }
}
