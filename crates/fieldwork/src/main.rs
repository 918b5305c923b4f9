// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fieldwork - client identity resolution and renewal scheduling.
//!
//! This is the binary entry point. Every subcommand prints JSON to stdout.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fieldwork_config::FieldworkConfig;
use fieldwork_core::FieldworkError;
use serde_json::Value;

use crate::commands::Workspace;

/// Fieldwork - service contract engine.
#[derive(Parser, Debug)]
#[command(name = "fieldwork", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the database and apply pending migrations.
    Migrate,
    /// Find or create the client for a mobile number.
    ResolveClient {
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// Derive missing renewals for a job card.
    Reconcile {
        job_card_id: i64,
        /// Accepted for parity with the engine call; dedup still applies.
        #[arg(long)]
        force: bool,
    },
    /// Mark renewals completed.
    Complete {
        #[arg(required = true)]
        renewal_ids: Vec<i64>,
    },
    /// Pause or resume a job card.
    Pause {
        job_card_id: i64,
        #[arg(long)]
        resume: bool,
    },
    /// Mark a job card paid or unpaid.
    Payment {
        job_card_id: i64,
        /// `paid` or `unpaid`.
        #[arg(long)]
        status: String,
    },
    /// Report duplicate and unnormalized client identifiers.
    AuditIdentifiers {
        /// Rewrite identifiers that can be normalized without a collision.
        #[arg(long)]
        fix: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => fieldwork_config::load_and_validate_path(path),
        None => fieldwork_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            fieldwork_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.log_level);

    match run(cli.command, &config).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("fieldwork: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("fieldwork: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, config: &FieldworkConfig) -> Result<Value, FieldworkError> {
    let workspace = Workspace::open(config).await?;
    let result = match command {
        Commands::Migrate => commands::migrate(config),
        Commands::ResolveClient { mobile, name, city } => {
            commands::resolve_client(&workspace, &mobile, &name, city).await
        }
        Commands::Reconcile { job_card_id, force } => {
            commands::reconcile(&workspace, job_card_id, force).await
        }
        Commands::Complete { renewal_ids } => commands::complete(&workspace, &renewal_ids).await,
        Commands::Pause {
            job_card_id,
            resume,
        } => commands::pause(&workspace, job_card_id, resume).await,
        Commands::Payment {
            job_card_id,
            status,
        } => commands::payment(&workspace, job_card_id, &status).await,
        Commands::AuditIdentifiers { fix } => commands::audit_identifiers(&workspace, fix).await,
    };
    workspace.close().await?;
    result
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fieldwork={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
