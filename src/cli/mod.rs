// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fruit ripeness pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "ripeness-pipeline")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Classify fruit images and summarize stored results", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify one or more images and store the records
    Classify(commands::ClassifyArgs),

    /// Aggregate stored records into label and date counts
    Dashboard(commands::DashboardArgs),

    /// Show how raw labels normalize
    Normalize(commands::NormalizeArgs),

    /// Print the fruit-to-model routing table
    Routes,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Classify(args) => commands::classify(args).await,
        Commands::Dashboard(args) => commands::dashboard(args).await,
        Commands::Normalize(args) => commands::normalize(args),
        Commands::Routes => commands::routes(),
    }
}
