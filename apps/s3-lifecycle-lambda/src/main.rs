//! Lambda entry point for s3-lifecycle.
//!
//! Built as the `bootstrap` binary of a `provided.al2023` function. Each
//! invocation reconciles every bucket and returns
//! `{ "statusCode": 200, "body": "Rules applied to N buckets." }`.
//!
//! The deployment configuration comes from the environment (see
//! `LifecycleConfig::from_env`); the invocation event may override day counts,
//! the rule selection, `dryRun` and `continueOnError`. Scheduler envelopes and
//! empty events apply the deployment defaults.

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use s3_lifecycle_aws::AwsLifecycleBackend;
use s3_lifecycle_core::{
    InvocationEvent, InvocationResponse, LifecycleBackend, LifecycleConfig, Orchestrator,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize JSON logging for CloudWatch.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<(), Error> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .map_err(|e| format!("invalid log level filter {log_level}: {e}"))?
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .init();

    Ok(())
}

/// Handle one invocation payload.
async fn handle(
    payload: Value,
    base: &LifecycleConfig,
    backend: Arc<dyn LifecycleBackend>,
) -> Result<InvocationResponse, Error> {
    let event = InvocationEvent::from_value(payload)?;
    let config = event.apply(base)?;
    info!(
        rules = ?config.managed_rules,
        multipart_abort_days = config.multipart_abort_days,
        tiering_days = config.tiering_days,
        dry_run = config.dry_run,
        "invocation started"
    );

    let summary = Orchestrator::from_config(backend, &config)?.run().await?;
    Ok(InvocationResponse::ok(&summary))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let base = LifecycleConfig::from_env()?;
    init_tracing(&base.log_level)?;

    let backend: Arc<dyn LifecycleBackend> =
        Arc::new(AwsLifecycleBackend::from_config(&base).await);
    let base = &base;
    let backend = &backend;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle(event.payload, base, Arc::clone(backend)).await
    }))
    .await
}
