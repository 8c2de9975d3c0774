// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ripeness_pipeline::labels::{FruitKey, ModelRouter, DEFAULT_RIPENESS_MODEL};

#[test]
fn test_route_never_empty() {
    let router = ModelRouter::with_defaults();
    for key in FruitKey::ALL {
        assert!(!router.route(key).is_empty(), "empty route for {}", key);
    }
    let bare = ModelRouter::new("generic/3").unwrap();
    for key in FruitKey::ALL {
        assert_eq!(bare.route(key), "generic/3");
    }
}

#[test]
fn test_default_routes() {
    let router = ModelRouter::with_defaults();
    assert_eq!(router.route(FruitKey::Orange), "orange-ripeness/1");
    assert_eq!(router.route(FruitKey::Mango), "mango-ripeness/1");
    assert_eq!(router.route(FruitKey::Default), DEFAULT_RIPENESS_MODEL);
}

#[test]
fn test_empty_identifiers_rejected() {
    assert!(ModelRouter::new("").is_err());
    assert!(ModelRouter::new("   ").is_err());
    let mut router = ModelRouter::with_defaults();
    assert!(router.set_route(FruitKey::Banana, "").is_err());
    assert_eq!(router.route(FruitKey::Banana), "banana-ripeness/1");
}

#[test]
fn test_missing_route_falls_back() {
    let router = ModelRouter::new("fallback/1")
        .unwrap()
        .with_route(FruitKey::Orange, "orange/9")
        .unwrap();
    assert_eq!(router.route_detailed(FruitKey::Orange), ("orange/9", true));
    assert_eq!(router.route_detailed(FruitKey::Avocado), ("fallback/1", false));
    assert_eq!(router.route_detailed(FruitKey::Default), ("fallback/1", true));
}

#[test]
fn test_table_lists_every_key() {
    let router = ModelRouter::with_defaults();
    let table = router.table();
    assert_eq!(table.len(), FruitKey::ALL.len());
    assert_eq!(table.last(), Some(&(FruitKey::Default, DEFAULT_RIPENESS_MODEL)));
}
