// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use futures::future::join_all;
use ripeness_pipeline::classification::mock::detection;
use ripeness_pipeline::classification::{
    ClassificationOrchestrator, ClassifyOptions, MockInferenceProvider, PipelineStrategy,
};
use ripeness_pipeline::labels::{CanonicalLabel, FruitKey, LabelTables};
use std::sync::Arc;
use std::time::Duration;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
const JPEG: &[u8] = b"\xff\xd8\xff\xe0\0\x10JFIF\0";

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let provider = Arc::new(
        MockInferenceProvider::new()
            .with_response("fruit-type-detection/1", vec![detection("orange", 0.9)])
            .with_response("orange-ripeness/1", vec![detection("ripen", 0.9)])
            .with_delay(Duration::from_millis(10)),
    );
    let tables = LabelTables::default().build("fruit-ripeness/1").unwrap();
    let orchestrator = Arc::new(ClassificationOrchestrator::new(
        provider.clone(),
        tables,
        PipelineStrategy::two_stage("fruit-type-detection/1"),
    ));

    let tasks = (0..16).map(|i| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            let image = if i % 2 == 0 { PNG } else { JPEG };
            let options = ClassifyOptions::default()
                .with_image_identifier(format!("img-{}", i))
                .with_threshold(0.5);
            orchestrator.classify(image, options).await
        })
    });

    let results = join_all(tasks).await;
    for (i, result) in results.into_iter().enumerate() {
        let record = result.unwrap().unwrap();
        assert_eq!(record.image_identifier, format!("img-{}", i));
        assert_eq!(record.fruit_type, FruitKey::Orange);
        assert_eq!(record.detections[0].label, CanonicalLabel::Ripe);
        assert_eq!(record.valid_count, Some(1));
    }

    assert_eq!(provider.call_count(), 32);
    assert_eq!(orchestrator.metrics().classifications_success(), 16);
}

#[tokio::test]
async fn test_stages_run_in_order_per_request() {
    let provider = Arc::new(
        MockInferenceProvider::new()
            .with_response("fruit-type-detection/1", vec![detection("mango", 0.9)])
            .with_response("mango-ripeness/1", vec![]),
    );
    let tables = LabelTables::default().build("fruit-ripeness/1").unwrap();
    let orchestrator = ClassificationOrchestrator::new(
        provider.clone(),
        tables,
        PipelineStrategy::two_stage("fruit-type-detection/1"),
    );

    orchestrator
        .classify(PNG, ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(
        provider.calls(),
        vec!["fruit-type-detection/1", "mango-ripeness/1"]
    );
}
