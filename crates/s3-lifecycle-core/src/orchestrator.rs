//! Run orchestration.
//!
//! [`Orchestrator`] enumerates buckets and reconciles every desired rule on
//! each of them, strictly one bucket and one rule at a time. By default the
//! first error aborts the run; with `continue_on_error` a failing bucket is
//! recorded in the [`RunSummary`] and the run moves on to the next bucket.

use std::sync::Arc;

use s3_lifecycle_model::{DesiredRuleSpec, Outcome};
use serde::Serialize;
use tracing::{error, info};

use crate::backend::LifecycleBackend;
use crate::config::LifecycleConfig;
use crate::enumerate::BucketEnumerator;
use crate::error::{LifecycleError, LifecycleResult};
use crate::reconcile::{ReconcileReport, Reconciler};

/// Receives progress notifications during a run.
pub trait RunObserver: Send + Sync {
    /// A bucket is about to be reconciled.
    fn bucket_started(&self, _bucket: &str) {}

    /// One rule has been reconciled on a bucket.
    fn rule_reconciled(&self, _report: &ReconcileReport) {}

    /// A bucket failed and was skipped.
    fn bucket_failed(&self, _bucket: &str, _error: &LifecycleError) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// A bucket skipped because of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketFailure {
    /// Bucket that failed.
    pub bucket: String,
    /// Rendered error.
    pub error: String,
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Number of buckets enumerated and visited. This is not the number of
    /// buckets that changed.
    pub buckets_processed: usize,
    /// One report per successful reconciliation, in run order.
    pub reports: Vec<ReconcileReport>,
    /// Buckets skipped because of errors.
    pub failures: Vec<BucketFailure>,
}

impl RunSummary {
    /// Number of reconciliations with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.reports.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Human-readable result line.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Rules applied to {} buckets.", self.buckets_processed)
    }
}

/// Drives a reconciliation run across every bucket.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    enumerator: BucketEnumerator,
    reconciler: Reconciler,
    desired: Vec<DesiredRuleSpec>,
    continue_on_error: bool,
}

impl Orchestrator {
    /// Build an orchestrator for `config` over `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` selects no rules or carries out-of-range
    /// day counts.
    pub fn from_config(
        backend: Arc<dyn LifecycleBackend>,
        config: &LifecycleConfig,
    ) -> LifecycleResult<Self> {
        config.validate()?;
        let reconciler = Reconciler::new(Arc::clone(&backend))
            .with_conflict_retries(config.conflict_retries)
            .with_dry_run(config.dry_run);

        Ok(Self {
            enumerator: BucketEnumerator::new(backend),
            reconciler,
            desired: config.desired_rules()?,
            continue_on_error: config.continue_on_error,
        })
    }

    /// The desired rules applied to every bucket, in order.
    #[must_use]
    pub fn desired_rules(&self) -> &[DesiredRuleSpec] {
        &self.desired
    }

    /// Run without progress notifications.
    pub async fn run(&self) -> LifecycleResult<RunSummary> {
        self.run_observed(&NoopObserver).await
    }

    /// Run, notifying `observer` of progress.
    pub async fn run_observed(&self, observer: &dyn RunObserver) -> LifecycleResult<RunSummary> {
        let buckets = self.enumerator.list_buckets().await?;
        let mut summary = RunSummary {
            buckets_processed: buckets.len(),
            ..RunSummary::default()
        };

        for bucket in &buckets {
            observer.bucket_started(bucket);
            info!(bucket = %bucket, "checking bucket");

            if let Err(e) = self.reconcile_bucket(bucket, observer, &mut summary).await {
                if !self.continue_on_error {
                    return Err(e);
                }
                error!(bucket = %bucket, error = %e, "bucket failed, continuing");
                observer.bucket_failed(bucket, &e);
                summary.failures.push(BucketFailure {
                    bucket: bucket.clone(),
                    error: e.to_string(),
                });
            }
        }

        info!(
            buckets = summary.buckets_processed,
            created = summary.count(Outcome::Created),
            updated = summary.count(Outcome::Updated),
            unchanged = summary.count(Outcome::Unchanged),
            failed = summary.failures.len(),
            "run complete"
        );
        Ok(summary)
    }

    async fn reconcile_bucket(
        &self,
        bucket: &str,
        observer: &dyn RunObserver,
        summary: &mut RunSummary,
    ) -> LifecycleResult<()> {
        for desired in &self.desired {
            let report = self.reconciler.reconcile(bucket, desired).await?;
            observer.rule_reconciled(&report);
            summary.reports.push(report);
        }
        Ok(())
    }
}
