// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ripeness_pipeline::labels::{CanonicalLabel, FruitKey, LabelTables, TableError};
use std::io::Write;
use tempfile::NamedTempFile;

const OVERRIDES: &str = r#"
[synonyms]
ripe = ["listo"]
overripe = ["mushy"]

[fruit_types]
orange = ["clementine"]

[routes]
orange = "orange-ripeness/3"
default = "generic-ripeness/2"
"#;

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(OVERRIDES.as_bytes()).unwrap();

    let tables = LabelTables::load(file.path()).unwrap();
    assert!(!tables.is_empty());

    let built = tables.build("fruit-ripeness/1").unwrap();
    assert_eq!(built.normalizer.normalize("Listo"), CanonicalLabel::Ripe);
    assert_eq!(built.normalizer.normalize("mushy"), CanonicalLabel::Overripe);
    // built-in synonyms survive
    assert_eq!(built.normalizer.normalize("ripen"), CanonicalLabel::Ripe);
    assert_eq!(built.resolver.translate("clementine"), Some(FruitKey::Orange));
    assert_eq!(built.router.route(FruitKey::Orange), "orange-ripeness/3");
    assert_eq!(built.router.route(FruitKey::Default), "generic-ripeness/2");
    assert_eq!(built.router.route(FruitKey::Banana), "banana-ripeness/1");
}

#[test]
fn test_empty_file_builds_defaults() {
    let file = NamedTempFile::new().unwrap();
    let tables = LabelTables::load(file.path()).unwrap();
    assert!(tables.is_empty());

    let built = tables.build("custom-default/1").unwrap();
    assert_eq!(built.router.route(FruitKey::Default), "custom-default/1");
    assert_eq!(built.normalizer.normalize("green"), CanonicalLabel::Unripe);
}

#[test]
fn test_unknown_group_rejected() {
    let tables = LabelTables::from_toml_str("[synonyms]\nbruised = [\"dented\"]\n").unwrap();
    let err = tables.build("fruit-ripeness/1").unwrap_err();
    assert!(matches!(err, TableError::UnknownGroup { table: "synonyms", .. }));

    let tables = LabelTables::from_toml_str("[routes]\nkiwi = \"kiwi/1\"\n").unwrap();
    assert!(matches!(
        tables.build("fruit-ripeness/1"),
        Err(TableError::UnknownGroup { table: "routes", .. })
    ));
}

#[test]
fn test_conflicting_synonym_rejected() {
    let tables = LabelTables::from_toml_str("[synonyms]\nunripe = [\"rotten\"]\n").unwrap();
    assert!(matches!(
        tables.build("fruit-ripeness/1"),
        Err(TableError::ConflictingSynonym { .. })
    ));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[synonyms\nripe = 3").unwrap();
    assert!(matches!(
        LabelTables::load(file.path()),
        Err(TableError::Parse { .. })
    ));
}
