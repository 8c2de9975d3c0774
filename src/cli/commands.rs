// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use futures::future::join_all;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::aggregation::AggregationSnapshot;
use crate::classification::ClassifyOptions;
use crate::config::PipelineConfig;
use crate::labels::CanonicalLabel;
use crate::service::PipelineService;

/// Arguments for the classify command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image files to classify
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Confidence threshold; enables valid/invalid counts
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Expected ripeness class (used in confidence-and-label mode)
    #[arg(long)]
    pub validated_class: Option<CanonicalLabel>,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,

    /// Print pipeline counters in Prometheus text format when done
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for the dashboard command
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the normalize command
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Raw labels to normalize
    #[arg(required = true)]
    pub labels: Vec<String>,
}

fn load_config() -> Result<PipelineConfig> {
    let config = PipelineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Classify images concurrently and persist each record
pub async fn classify(args: ClassifyArgs) -> Result<()> {
    let config = load_config()?;
    let service = PipelineService::from_config(&config)?;

    let mut jobs = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let image = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let identifier = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut options = ClassifyOptions::default().with_image_identifier(identifier);
        if let Some(threshold) = args.threshold {
            options = options.with_threshold(threshold);
        }
        if let Some(label) = args.validated_class {
            options = options.with_validated_class(label);
        }

        let service = service.clone();
        jobs.push(async move { service.classify_and_store(&image, options).await });
    }

    info!("Classifying {} images", jobs.len());
    let mut failures = 0usize;
    for (path, result) in args.images.iter().zip(join_all(jobs).await) {
        match result {
            Ok(stored) if args.json => {
                println!("{}", serde_json::to_string_pretty(&stored)?);
            }
            Ok(stored) => {
                let record = &stored.record;
                println!(
                    "✅ {} -> {} via {} ({})",
                    record.image_identifier, record.fruit_type, record.model_used, stored.record_id
                );
                for detection in &record.detections {
                    println!(
                        "   {:<9} {:.2}  (raw: {})",
                        detection.label, detection.confidence, detection.raw_label
                    );
                }
                if let (Some(valid), Some(invalid)) = (record.valid_count, record.invalid_count) {
                    println!("   valid: {}, invalid: {}", valid, invalid);
                }
            }
            Err(e) => {
                failures += 1;
                warn!("{} failed: {}", path.display(), e);
                eprintln!("❌ {}: [{}] {}", path.display(), e.kind(), e);
            }
        }
    }

    if args.metrics {
        print!("{}", service.metrics().export_prometheus());
    }

    if failures > 0 {
        return Err(anyhow!("{} of {} images failed", failures, args.images.len()));
    }
    Ok(())
}

/// Aggregate every stored record
pub async fn dashboard(args: DashboardArgs) -> Result<()> {
    let config = load_config()?;
    if !config.is_persistent() {
        warn!(
            "STORAGE_BACKEND={} keeps records only for one process; the dashboard will be empty",
            config.storage
        );
    }
    let service = PipelineService::from_config(&config)?;
    let snapshot = service.dashboard().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(snapshot: &AggregationSnapshot) {
    println!(
        "📊 {} records, {} detections",
        snapshot.total_records(),
        snapshot.total_detections()
    );
    println!("\nLabels:");
    for (count, (_, share)) in snapshot.label_counts.iter().zip(snapshot.label_share()) {
        println!("  {:<9} {:>6}  {:>5.1}%", count.label, count.count, share * 100.0);
    }
    println!("\nDates:");
    for (date, count) in &snapshot.date_counts {
        println!("  {}  {:>6}", date, count);
    }
}

/// Show how raw labels normalize under the configured tables
pub fn normalize(args: NormalizeArgs) -> Result<()> {
    let tables = PipelineConfig::from_env().load_tables()?;
    for raw in &args.labels {
        match tables.normalizer.lookup(raw) {
            Some(label) => println!("{:<20} -> {}", raw, label),
            None => println!("{:<20} -> {} (no synonym)", raw, CanonicalLabel::Unknown),
        }
    }
    Ok(())
}

/// Print the fruit key to model routing table
pub fn routes() -> Result<()> {
    let tables = PipelineConfig::from_env().load_tables()?;
    for (key, model) in tables.router.table() {
        println!("{:<12} {}", key, model);
    }
    Ok(())
}
