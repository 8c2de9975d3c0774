// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use chrono::NaiveDate;
use ripeness_pipeline::classification::mock::detection;
use ripeness_pipeline::classification::{
    ClassificationError, ClassificationOrchestrator, ClassificationRecord, ClassifyOptions,
    MockInferenceProvider, PipelineStrategy,
};
use ripeness_pipeline::config::{PipelineConfig, StorageBackend};
use ripeness_pipeline::labels::{CanonicalLabel, LabelTables};
use ripeness_pipeline::service::PipelineService;
use ripeness_pipeline::storage::{InMemoryRecordStore, PersistenceError, RecordStore, StoredRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
const FRUIT_MODEL: &str = "fruit-type-detection/1";

/// Store that refuses every write
#[derive(Default)]
struct FailingStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn insert(&self, _record_id: &str, _record: &ClassificationRecord) -> Result<(), PersistenceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::Rejected {
            status: 503,
            message: "database unavailable".to_string(),
        })
    }

    async fn select_all(&self) -> Result<Vec<StoredRecord>, PersistenceError> {
        Err(PersistenceError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn orchestrator(provider: Arc<MockInferenceProvider>) -> Arc<ClassificationOrchestrator> {
    let tables = LabelTables::default().build("fruit-ripeness/1").unwrap();
    Arc::new(ClassificationOrchestrator::new(
        provider,
        tables,
        PipelineStrategy::two_stage(FRUIT_MODEL),
    ))
}

fn orange_provider() -> Arc<MockInferenceProvider> {
    Arc::new(
        MockInferenceProvider::new()
            .with_response(FRUIT_MODEL, vec![detection("orange", 0.8)])
            .with_response(
                "orange-ripeness/1",
                vec![detection("ripen", 0.9), detection("green", 0.3)],
            ),
    )
}

#[tokio::test]
async fn test_persistence_failure_is_surfaced() {
    let store = Arc::new(FailingStore::default());
    let service = PipelineService::new(orchestrator(orange_provider()), store.clone());

    let err = service
        .classify_and_store(PNG, ClassifyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClassificationError::Persistence(PersistenceError::Rejected { status: 503, .. })
    ));
    assert_eq!(err.kind(), "persistence_error");
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(service.metrics().persistence_errors(), 1);
    assert_eq!(service.metrics().records_persisted(), 0);
}

#[tokio::test]
async fn test_dashboard_surfaces_read_failure() {
    let service = PipelineService::new(orchestrator(orange_provider()), Arc::new(FailingStore::default()));
    assert!(matches!(
        service.dashboard().await,
        Err(PersistenceError::Transport(_))
    ));
}

#[tokio::test]
async fn test_no_detection_persists_nothing() {
    let provider = Arc::new(MockInferenceProvider::new().with_response(FRUIT_MODEL, vec![]));
    let store = Arc::new(InMemoryRecordStore::new());
    let service = PipelineService::new(orchestrator(provider.clone()), store.clone());

    let err = service
        .classify_and_store(PNG, ClassifyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClassificationError::NoDetection { .. }));
    assert_eq!(provider.call_count(), 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_classify_then_dashboard() {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = PipelineService::new(orchestrator(orange_provider()), store.clone());

    let first = service
        .classify_and_store(PNG, ClassifyOptions::default().with_threshold(0.5))
        .await
        .unwrap();
    let second = service
        .classify_and_store(PNG, ClassifyOptions::default())
        .await
        .unwrap();
    assert_ne!(first.record_id, second.record_id);
    assert_eq!(first.record.valid_count, Some(1));

    let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let snapshot = service.dashboard_on(today).await.unwrap();
    assert_eq!(snapshot.total_records(), 2);
    assert_eq!(snapshot.label_count(CanonicalLabel::Ripe), 2);
    assert_eq!(snapshot.label_count(CanonicalLabel::Unripe), 2);
    assert_eq!(snapshot.date_count(today), 0);
    assert_eq!(service.metrics().aggregations_total(), 1);
}

#[tokio::test]
async fn test_service_from_default_config() {
    let config = PipelineConfig::default();
    let service = PipelineService::from_config(&config).unwrap();
    assert_eq!(service.store().name(), "memory");
    assert_eq!(service.orchestrator().strategy().name(), "two-stage");
}

#[tokio::test]
async fn test_service_from_invalid_config() {
    let mut config = PipelineConfig::default();
    config.storage = StorageBackend::Supabase;
    assert!(PipelineService::from_config(&config).is_err());
}
