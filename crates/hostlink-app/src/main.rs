// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hostlink — correlation bridge between in-process callers and the host's
// native module.
//
// Entry point. Initialises logging, loads the bridge config, and runs a
// scripted session against the in-process loopback module.

mod services;

use std::path::PathBuf;

use clap::Parser;

use services::config_store::{default_config_path, load_config, persist_config};
use services::session::{SessionOptions, run_session, write_reports};

#[derive(Debug, Parser)]
#[command(name = "hostlink", version, about = "Run a scripted host session over the bridge")]
struct Cli {
    /// Config file (defaults to hostlink.json in the config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config back to disk before running.
    #[arg(long)]
    save_config: bool,

    /// Disable requestPayment for this run.
    #[arg(long)]
    no_payments: bool,

    /// Per-call deadline in milliseconds (overrides the config file).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Sub-application to launch.
    #[arg(long, default_value = "demo-app")]
    app_id: String,

    /// Payment amount.
    #[arg(long, default_value_t = 4.5)]
    amount: f64,

    /// Payment currency (ISO 4217).
    #[arg(long, default_value = "EUR")]
    currency: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Hostlink starting");

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path);
    if cli.no_payments {
        config.payments_enabled = false;
    }
    if let Some(ms) = cli.timeout_ms {
        config.call_timeout_ms = Some(ms);
    }
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid settings");
        std::process::exit(2);
    }

    if cli.save_config {
        if let Err(e) = persist_config(&config_path, &config) {
            tracing::error!(error = %e, path = %config_path.display(), "could not save config");
            std::process::exit(1);
        }
    }

    let options = SessionOptions {
        app_id: cli.app_id,
        amount: cli.amount,
        currency: cli.currency,
        ..Default::default()
    };
    let reports = run_session(&config, &options).await;

    let stdout = std::io::stdout();
    if let Err(e) = write_reports(&mut stdout.lock(), &reports) {
        tracing::error!(error = %e, "could not write session report");
        std::process::exit(1);
    }

    if reports.iter().any(|r| r.error.is_some()) {
        std::process::exit(1);
    }
}
