//! s3-lifecycle - apply managed lifecycle rules to every bucket.
//!
//! Walks all buckets visible to the caller and makes sure each carries the
//! `MultipartUploadRule` (abort incomplete uploads) and the
//! `IntelligentTieringRule` (transition to INTELLIGENT_TIERING), leaving every
//! other rule untouched.
//!
//! # Usage
//!
//! ```text
//! s3-lifecycle --multipart-abort-days 7 --tiering-days 30
//! s3-lifecycle --rule intelligent-tiering --tiering-days 45 --dry-run
//! S3_ENDPOINT_URL=http://localhost:4566 s3-lifecycle --force-path-style
//! ```
//!
//! # Environment Variables
//!
//! Every variable read by `LifecycleConfig::from_env` applies; flags take
//! precedence over them.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MULTIPART_ABORT_DAYS` | `7` | Days before incomplete uploads are aborted |
//! | `TIERING_DAYS` | `30` | Days before objects move to INTELLIGENT_TIERING |
//! | `MANAGED_RULES` | both | Comma-separated rule kinds |
//! | `S3_ENDPOINT_URL` | *(unset)* | S3-compatible endpoint |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use s3_lifecycle_aws::AwsLifecycleBackend;
use s3_lifecycle_core::{
    LifecycleConfig, LifecycleError, Orchestrator, ReconcileReport, RunObserver,
};
use s3_lifecycle_model::{ManagedRuleKind, Outcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Apply managed S3 lifecycle rules to every bucket.
#[derive(Debug, Parser)]
#[command(name = "s3-lifecycle", version, about)]
struct Cli {
    /// Days after initiation before incomplete multipart uploads are aborted.
    #[arg(long, value_name = "DAYS")]
    multipart_abort_days: Option<i32>,

    /// Days after creation before objects transition to INTELLIGENT_TIERING.
    #[arg(long, value_name = "DAYS")]
    tiering_days: Option<i32>,

    /// Rule kind to apply (`multipart-abort`, `intelligent-tiering`). Repeat
    /// to select several; defaults to all.
    #[arg(long = "rule", value_name = "KIND")]
    rules: Vec<ManagedRuleKind>,

    /// Report what would change without writing.
    #[arg(long)]
    dry_run: bool,

    /// Log failing buckets and keep going.
    #[arg(long)]
    continue_on_error: bool,

    /// S3-compatible endpoint URL.
    #[arg(long, value_name = "URL")]
    endpoint_url: Option<String>,

    /// Use path-style bucket addressing.
    #[arg(long)]
    force_path_style: bool,

    /// Log level filter, e.g. `info` or `s3_lifecycle_core=debug`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

impl Cli {
    /// Layer the flags over `base`. Unset flags keep the base value.
    fn apply(self, base: LifecycleConfig) -> LifecycleConfig {
        let mut config = base;
        if let Some(days) = self.multipart_abort_days {
            config.multipart_abort_days = days;
        }
        if let Some(days) = self.tiering_days {
            config.tiering_days = days;
        }
        if !self.rules.is_empty() {
            let mut selected = Vec::with_capacity(self.rules.len());
            for kind in self.rules {
                if !selected.contains(&kind) {
                    selected.push(kind);
                }
            }
            config.managed_rules = selected;
        }
        config.dry_run |= self.dry_run;
        config.continue_on_error |= self.continue_on_error;
        config.force_path_style |= self.force_path_style;
        if self.endpoint_url.is_some() {
            config.endpoint_url = self.endpoint_url;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config
    }
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout carries only progress lines.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Prints one human-readable line per progress event.
#[derive(Debug, Default)]
struct ConsoleProgress;

impl RunObserver for ConsoleProgress {
    fn bucket_started(&self, bucket: &str) {
        println!("Checking bucket: {bucket}");
    }

    fn rule_reconciled(&self, report: &ReconcileReport) {
        println!("{}", progress_line(report));
    }

    fn bucket_failed(&self, bucket: &str, error: &LifecycleError) {
        eprintln!("Skipping bucket {bucket}: {error}");
    }
}

fn progress_line(report: &ReconcileReport) -> String {
    let ReconcileReport {
        bucket, rule_id, ..
    } = report;
    match report.outcome {
        Outcome::Unchanged => format!("{rule_id} already applied on bucket {bucket}."),
        Outcome::Created | Outcome::Updated if !report.written => {
            format!("{rule_id} would be {} on bucket {bucket} (dry run).", report.outcome)
        }
        Outcome::Created | Outcome::Updated => {
            format!("{rule_id} {} on bucket {bucket}.", report.outcome)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = LifecycleConfig::from_env().context("invalid environment configuration")?;
    let config = cli.apply(base);

    init_tracing(&config.log_level)?;

    info!(
        rules = ?config.managed_rules,
        multipart_abort_days = config.multipart_abort_days,
        tiering_days = config.tiering_days,
        dry_run = config.dry_run,
        continue_on_error = config.continue_on_error,
        endpoint_url = ?config.endpoint_url,
        "starting s3-lifecycle",
    );

    let backend = AwsLifecycleBackend::from_config(&config).await;
    let orchestrator =
        Orchestrator::from_config(Arc::new(backend), &config).context("invalid configuration")?;

    let summary = orchestrator
        .run_observed(&ConsoleProgress)
        .await
        .context("lifecycle run failed")?;

    println!("{}", summary.message());
    if !summary.failures.is_empty() {
        anyhow::bail!("{} bucket(s) failed", summary.failures.len());
    }
    Ok(())
}
