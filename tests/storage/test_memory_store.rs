// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{TimeZone, Utc};
use ripeness_pipeline::classification::{BoundingBox, ClassificationRecord, LabeledDetection};
use ripeness_pipeline::labels::{CanonicalLabel, FruitKey};
use ripeness_pipeline::storage::{
    record_row, InMemoryRecordStore, PersistenceError, RecordStore, StoredRecord,
};
use serde_json::json;

fn record(label: CanonicalLabel) -> ClassificationRecord {
    ClassificationRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        image_identifier: "orange-1.jpg".to_string(),
        fruit_type: FruitKey::Orange,
        model_used: "orange-ripeness/1".to_string(),
        detections: vec![LabeledDetection {
            label,
            raw_label: "raw".to_string(),
            confidence: 0.75,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }],
        validated_class: Some(CanonicalLabel::Ripe),
        threshold: Some(0.5),
        valid_count: Some(1),
        invalid_count: Some(0),
    }
}

#[tokio::test]
async fn test_stored_row_reads_back() {
    let store = InMemoryRecordStore::new();
    store.insert("id-1", &record(CanonicalLabel::Ripe)).await.unwrap();

    let rows = store.select_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id.as_deref(), Some("id-1"));
    assert_eq!(row.timestamp.as_deref(), Some("2024-05-01T08:00:00Z"));
    assert_eq!(row.fruit_type.as_deref(), Some("orange"));
    assert_eq!(row.model_used.as_deref(), Some("orange-ripeness/1"));
    assert_eq!(row.detections_or_empty()[0].label.as_deref(), Some("ripe"));
    assert_eq!(row.detections_or_empty()[0].confidence, Some(0.75));
    assert!(!row.malformed);

    let expected = record_row("id-1", &record(CanonicalLabel::Ripe)).unwrap();
    assert_eq!(StoredRecord::from_value(&expected), row.clone());
}

#[tokio::test]
async fn test_duplicate_insert_rejected() {
    let store = InMemoryRecordStore::new();
    store.insert("dup", &record(CanonicalLabel::Ripe)).await.unwrap();
    let err = store.insert("dup", &record(CanonicalLabel::Unripe)).await.unwrap_err();
    assert!(matches!(err, PersistenceError::Rejected { status: 409, .. }));
}

#[tokio::test]
async fn test_legacy_rows_alongside_new_ones() {
    let store = InMemoryRecordStore::new();
    store
        .insert_raw(json!({"filename": "old.png", "created_at": "2023-11-02 10:00:00", "detections": "[]"}))
        .await;
    store.insert("new", &record(CanonicalLabel::Overripe)).await.unwrap();

    let rows = store.select_all().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].image_identifier.as_deref(), Some("old.png"));
    assert!(rows[0].detections_or_empty().is_empty());
    assert!(!rows[0].malformed);
}

#[tokio::test]
async fn test_concurrent_inserts() {
    let store = InMemoryRecordStore::new();
    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.insert(&format!("r{}", i), &record(CanonicalLabel::Ripe)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(store.len().await, 20);
}
