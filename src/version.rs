// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the ripeness pipeline

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-13";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "two-stage-routing",
    "single-stage",
    "label-normalization",
    "validity-modes",
    "supabase-store",
    "toml-label-tables",
    "prometheus-export",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!(
        "Ripeness Pipeline {} ({}) [{}]",
        VERSION_NUMBER,
        BUILD_DATE,
        FEATURES.join(", ")
    )
}
