// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ripeness_pipeline::labels::{CanonicalLabel, LabelNormalizer, SynonymTable, TableError};

#[test]
fn test_case_and_whitespace_insensitive() {
    let normalizer = LabelNormalizer::with_defaults();
    let expected = normalizer.normalize("RIPE");
    assert_eq!(expected, CanonicalLabel::Ripe);
    assert_eq!(normalizer.normalize(" ripe "), expected);
    assert_eq!(normalizer.normalize("ripen"), expected);
}

#[test]
fn test_idempotent_over_sample_inputs() {
    let normalizer = LabelNormalizer::with_defaults();
    let inputs = [
        "RIPE", "ripen", "  Green ", "too ripe", "too_ripe", "Rotten", "verde", "", "???",
        "unknown", "blotchy", "ripe-orange", "OVERRIPE",
    ];
    for raw in inputs {
        let once = normalizer.normalize(raw);
        let twice = normalizer.normalize(once.as_str());
        assert_eq!(once, twice, "normalize not idempotent for {:?}", raw);
    }
}

#[test]
fn test_default_groups() {
    let normalizer = LabelNormalizer::with_defaults();
    for raw in ["unripe", "unripen", "green", "immature", "verde", "inmaduro"] {
        assert_eq!(normalizer.normalize(raw), CanonicalLabel::Unripe, "{}", raw);
    }
    for raw in ["ripe", "ripen", "ripe-orange", "mature", "maduro"] {
        assert_eq!(normalizer.normalize(raw), CanonicalLabel::Ripe, "{}", raw);
    }
    for raw in ["overripe", "too-ripe", "rotten", "podrido", "sobremaduro"] {
        assert_eq!(normalizer.normalize(raw), CanonicalLabel::Overripe, "{}", raw);
    }
}

#[test]
fn test_separator_variants_agree() {
    let normalizer = LabelNormalizer::with_defaults();
    assert_eq!(normalizer.normalize("too ripe"), CanonicalLabel::Overripe);
    assert_eq!(normalizer.normalize("too_ripe"), CanonicalLabel::Overripe);
    assert_eq!(normalizer.normalize("Too  -  Ripe"), CanonicalLabel::Overripe);
}

#[test]
fn test_miss_is_unknown_but_lookup_distinguishes() {
    let normalizer = LabelNormalizer::with_defaults();
    assert_eq!(normalizer.normalize("blotchy"), CanonicalLabel::Unknown);
    assert_eq!(normalizer.lookup("blotchy"), None);
    assert_eq!(normalizer.lookup("unknown"), Some(CanonicalLabel::Unknown));
}

#[test]
fn test_custom_table_conflict_rejected() {
    let table = SynonymTable::empty()
        .with_group(CanonicalLabel::Ripe, ["soft"])
        .with_group(CanonicalLabel::Overripe, ["Soft"]);
    let err = LabelNormalizer::new(&table).unwrap_err();
    assert!(matches!(err, TableError::ConflictingSynonym { .. }));
}

#[test]
fn test_custom_table_keeps_canonical_names() {
    let table = SynonymTable::empty().with_group(CanonicalLabel::Unripe, ["hard"]);
    let normalizer = LabelNormalizer::new(&table).unwrap();
    assert_eq!(normalizer.normalize("hard"), CanonicalLabel::Unripe);
    assert_eq!(normalizer.normalize("overripe"), CanonicalLabel::Overripe);
    assert_eq!(normalizer.normalize("green"), CanonicalLabel::Unknown);
}

#[tokio::test]
async fn test_shared_across_tasks() {
    let normalizer = std::sync::Arc::new(LabelNormalizer::with_defaults());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let normalizer = normalizer.clone();
            tokio::spawn(async move {
                let raw = if i % 2 == 0 { "ripen" } else { "green" };
                normalizer.normalize(raw)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let label = handle.await.unwrap();
        let expected = if i % 2 == 0 {
            CanonicalLabel::Ripe
        } else {
            CanonicalLabel::Unripe
        };
        assert_eq!(label, expected);
    }
}
