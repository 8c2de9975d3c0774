// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ripeness_pipeline::classification::mock::detection;
use ripeness_pipeline::classification::{
    ClassificationError, ClassificationOrchestrator, ClassifyOptions, MockInferenceProvider,
    PipelineStrategy, ValidityMode,
};
use ripeness_pipeline::labels::{CanonicalLabel, FruitKey, LabelTables};
use std::sync::Arc;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

fn single_stage(mode: ValidityMode) -> ClassificationOrchestrator {
    let provider = MockInferenceProvider::new().with_response(
        "orange-ripeness/1",
        vec![
            detection("ripe", 0.9),
            detection("green", 0.8),
            detection("ripen", 0.4),
        ],
    );
    let tables = LabelTables::default().build("fruit-ripeness/1").unwrap();
    ClassificationOrchestrator::new(
        Arc::new(provider),
        tables,
        PipelineStrategy::single_stage("orange-ripeness/1", FruitKey::Orange),
    )
    .with_validity_mode(mode)
}

#[tokio::test]
async fn test_confidence_only_mode_ignores_label() {
    let orchestrator = single_stage(ValidityMode::ConfidenceOnly);
    let record = orchestrator
        .classify(
            PNG,
            ClassifyOptions::default()
                .with_threshold(0.5)
                .with_validated_class(CanonicalLabel::Ripe),
        )
        .await
        .unwrap();
    assert_eq!(record.valid_count, Some(2));
    assert_eq!(record.invalid_count, Some(1));
    assert_eq!(record.validated_class, Some(CanonicalLabel::Ripe));
}

#[tokio::test]
async fn test_confidence_and_label_mode_requires_match() {
    let orchestrator = single_stage(ValidityMode::ConfidenceAndLabel);
    let record = orchestrator
        .classify(
            PNG,
            ClassifyOptions::default()
                .with_threshold(0.5)
                .with_validated_class(CanonicalLabel::Ripe),
        )
        .await
        .unwrap();
    // green passes the threshold but is unripe; ripen matches but is below it
    assert_eq!(record.valid_count, Some(1));
    assert_eq!(record.invalid_count, Some(2));
}

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let orchestrator = single_stage(ValidityMode::ConfidenceOnly);
    let record = orchestrator
        .classify(PNG, ClassifyOptions::default().with_threshold(0.4))
        .await
        .unwrap();
    assert_eq!(record.valid_count, Some(3));
    assert_eq!(record.invalid_count, Some(0));
}

#[tokio::test]
async fn test_no_threshold_no_counts() {
    let orchestrator = single_stage(ValidityMode::ConfidenceAndLabel);
    let record = orchestrator
        .classify(PNG, ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(record.valid_count, None);
    assert_eq!(record.invalid_count, None);
}

#[tokio::test]
async fn test_label_mode_without_class_is_validation_error() {
    let orchestrator = single_stage(ValidityMode::ConfidenceAndLabel);
    let err = orchestrator
        .classify(PNG, ClassifyOptions::default().with_threshold(0.5))
        .await
        .unwrap_err();
    match err {
        ClassificationError::Validation { field, .. } => assert_eq!(field, "validated_class"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_out_of_range_threshold_rejected() {
    let orchestrator = single_stage(ValidityMode::ConfidenceOnly);
    for threshold in [-0.1, 1.5, f32::NAN] {
        let err = orchestrator
            .classify(PNG, ClassifyOptions::default().with_threshold(threshold))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }
}
