// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ripeness_pipeline::classification::roboflow::parse_detect_response;
use ripeness_pipeline::classification::{InferenceError, InferenceProvider, RoboflowClient};

#[test]
fn test_parse_multiple_predictions() {
    let body = r#"{
        "predictions": [
            {"x": 10, "y": 20, "width": 30, "height": 40, "confidence": 0.5, "class": "green"},
            {"x": 1.5, "y": 2.5, "width": 3.5, "height": 4.5, "confidence": 0.75, "class": "too ripe"}
        ]
    }"#;
    let detections = parse_detect_response(body).unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].label, "green");
    assert_eq!(detections[0].bbox.x, 10.0);
    assert_eq!(detections[1].label, "too ripe");
    assert!(detections.iter().all(|d| d.validate().is_ok()));
}

#[test]
fn test_prediction_missing_class_is_malformed() {
    let body = r#"{"predictions": [{"x": 1, "y": 1, "width": 1, "height": 1, "confidence": 0.5}]}"#;
    assert!(matches!(
        parse_detect_response(body),
        Err(InferenceError::MalformedResponse(_))
    ));
}

#[test]
fn test_client_name_and_endpoint() {
    let client = RoboflowClient::new("http://localhost:9001///", None, 500).unwrap();
    assert_eq!(client.name(), "roboflow");
    assert_eq!(client.endpoint(), "http://localhost:9001");
}
