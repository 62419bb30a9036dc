// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mailbox Simulator
//!
//! Runs one simulated, rate-limited creation run and writes its report.
//!
//! ## Configuration
//!
//! Settings come from, lowest to highest precedence: built-in defaults, a
//! JSON file given with `--config`, then flags or their environment
//! variables (a `.env` file is honoured):
//!
//! - `TARGET_COUNT`: Identities to attempt (default: 100)
//! - `DURATION_HOURS`: Span to spread the batches over (default: 2)
//! - `MAX_EMAILS_PER_HOUR`: Attempt rate cap (default: 50)
//! - `TEST_DOMAIN`: Mailbox domain (default: synthesized)
//! - `SEED`: Random seed for a reproducible run
//!
//! Ctrl-C stops the run after the current attempt; the partial report is
//! still written.

use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use mailbox_sim::{
    config::{Config, ConfigOverrides, LoggingConfig},
    Report, RunMetrics, Scheduler,
};

#[derive(Parser)]
#[command(name = "mailbox-sim", about = "Paced batch simulator for synthetic test mailboxes")]
struct Args {
    /// JSON configuration file
    #[arg(long, env = "MAILBOX_SIM_CONFIG")]
    config: Option<PathBuf>,

    /// Number of identities to attempt
    #[arg(long, env = "TARGET_COUNT")]
    target_count: Option<u32>,

    /// Hours to spread the batches across
    #[arg(long, env = "DURATION_HOURS")]
    duration_hours: Option<u32>,

    /// Maximum attempts per hour
    #[arg(long, env = "MAX_EMAILS_PER_HOUR")]
    max_per_hour: Option<u32>,

    /// Mailbox domain (synthesized when omitted)
    #[arg(long, env = "TEST_DOMAIN")]
    domain: Option<String>,

    /// Random seed for a reproducible run
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    /// Directory the JSON report is written into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip writing the JSON report
    #[arg(long)]
    no_report: bool,

    /// Log file appended to alongside stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit JSON log lines on stdout
    #[arg(long)]
    log_json: bool,

    /// Write Prometheus metrics to this file at run end
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Drop the simulated service response time
    #[arg(long)]
    no_latency: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            target_count: self.target_count,
            duration_hours: self.duration_hours,
            max_per_hour: self.max_per_hour,
            domain: self.domain.clone(),
            seed: self.seed,
            output_dir: self.output_dir.clone(),
            no_report: self.no_report,
            log_file: self.log_file.clone(),
            log_json: self.log_json,
            metrics_file: self.metrics_file.clone(),
            no_latency: self.no_latency,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let overrides = args.overrides();

    let config = match Config::load(args.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            // Log through the same sinks a run would have used.
            let mut fallback = Config::default();
            fallback.apply_overrides(&overrides);
            init_tracing(&fallback.logging)?;
            error!(error = %e, "Test execution failed");
            return Err(e.into());
        }
    };
    init_tracing(&config.logging)?;

    if let Err(e) = run(config).await {
        error!(error = %e, "Test execution failed");
        return Err(e);
    }
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current attempt");
            shutdown_tx.send(true).ok();
        }
    });

    let mut scheduler = Scheduler::from_config(&config)?.with_shutdown(shutdown_rx);
    info!(
        domain = scheduler.domain(),
        target_count = config.target_count,
        duration_hours = config.duration_hours,
        max_per_hour = config.rate_limit.max_per_hour,
        seed = ?config.seed,
        "Starting mailbox simulator"
    );

    let result = scheduler
        .execute(config.target_count, config.duration_hours)
        .await?;
    let metrics = RunMetrics::aggregate(&result);
    let report = Report::build(&result, metrics);

    if config.report.enabled {
        report.write_to_dir(&config.report.output_dir)?;
    }
    if config.metrics.enabled {
        scheduler.telemetry().write_to(&config.metrics.path)?;
        info!(path = %config.metrics.path.display(), "Metrics written");
    }

    println!("Test completed: {} emails created", report.successfully_created);
    println!("Success rate: {}", report.success_rate);
    println!("Test duration: {}", report.test_duration);
    Ok(())
}

/// Log to stdout and append to the log file.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .with_context(|| format!("opening log file {}", logging.file.display()))?;

    let stdout_layer: Box<dyn Layer<Registry> + Send + Sync> = if logging.json {
        Box::new(fmt::layer().json())
    } else {
        Box::new(fmt::layer())
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();
    Ok(())
}
