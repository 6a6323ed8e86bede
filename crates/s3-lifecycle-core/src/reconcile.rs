//! Rule reconciliation.
//!
//! [`reconcile_rules`] is the decision logic: given the current rule list and
//! one desired rule it leaves the list alone, updates the matching rule in
//! place, or appends a new rule. [`Reconciler`] wraps it in the
//! read / decide / conditional-write cycle against a [`LifecycleBackend`].
//!
//! Rules are keyed by `id` only. If the backend returns several rules with the
//! same id, the first one in list order is the one reconciled and the others
//! are left as they are.

use std::sync::Arc;

use s3_lifecycle_model::{DesiredRuleSpec, LifecycleRule, Outcome};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{LifecycleBackend, WriteOutcome};
use crate::error::{LifecycleError, LifecycleResult};

/// Bring `rules` into agreement with `desired`, in place.
///
/// Rules with other ids are never touched, and their order is kept. A new
/// rule is appended at the end.
pub fn reconcile_rules(rules: &mut Vec<LifecycleRule>, desired: &DesiredRuleSpec) -> Outcome {
    if let Some(existing) = rules.iter_mut().find(|rule| rule.has_id(&desired.id)) {
        if desired.is_satisfied_by(existing) {
            return Outcome::Unchanged;
        }
        desired.apply_to(existing);
        return Outcome::Updated;
    }

    rules.push(desired.to_rule());
    Outcome::Created
}

/// Number of rules in `rules` carrying `id`.
fn count_with_id(rules: &[LifecycleRule], id: &str) -> usize {
    rules.iter().filter(|rule| rule.has_id(id)).count()
}

/// What one reconciliation call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Bucket that was reconciled.
    pub bucket: String,
    /// Id of the reconciled rule.
    pub rule_id: String,
    /// Decision taken.
    pub outcome: Outcome,
    /// Whether the change was actually written (false for dry runs and
    /// unchanged rules).
    pub written: bool,
    /// Read/write attempts used, more than one only after conflicts.
    pub attempts: u32,
}

/// Reconciles one desired rule on one bucket at a time.
#[derive(Debug, Clone)]
pub struct Reconciler {
    backend: Arc<dyn LifecycleBackend>,
    conflict_retries: u32,
    dry_run: bool,
}

impl Reconciler {
    /// Create a reconciler over `backend` that writes changes and does not
    /// retry on conflicts.
    #[must_use]
    pub fn new(backend: Arc<dyn LifecycleBackend>) -> Self {
        Self {
            backend,
            conflict_retries: 0,
            dry_run: false,
        }
    }

    /// Re-read and re-decide up to `retries` times when the configuration
    /// changes between read and write.
    #[must_use]
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Decide and report without writing anything.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile `desired` on `bucket`.
    ///
    /// Reads the current rules, decides, and writes the full rule list back
    /// when the outcome is `Created` or `Updated`. Backend errors are returned
    /// as-is.
    pub async fn reconcile(
        &self,
        bucket: &str,
        desired: &DesiredRuleSpec,
    ) -> LifecycleResult<ReconcileReport> {
        desired.validate()?;

        let mut attempts = 0;
        loop {
            attempts += 1;

            let snapshot = self.backend.read_lifecycle(bucket).await?;
            let duplicates = count_with_id(&snapshot.rules, &desired.id);
            if duplicates > 1 {
                warn!(
                    bucket,
                    rule_id = %desired.id,
                    duplicates,
                    "multiple rules share this id, reconciling the first one only"
                );
            }

            let mut rules = snapshot.rules;
            let outcome = reconcile_rules(&mut rules, desired);
            let mut report = ReconcileReport {
                bucket: bucket.to_owned(),
                rule_id: desired.id.clone(),
                outcome,
                written: false,
                attempts,
            };

            if !outcome.requires_write() {
                debug!(bucket, rule_id = %desired.id, "rule already up to date");
                return Ok(report);
            }
            if self.dry_run {
                info!(bucket, rule_id = %desired.id, %outcome, "dry run, not writing");
                return Ok(report);
            }

            match self
                .backend
                .write_lifecycle(bucket, &rules, &snapshot.version)
                .await?
            {
                WriteOutcome::Applied => {
                    report.written = true;
                    info!(bucket, rule_id = %desired.id, %outcome, "lifecycle rule applied");
                    return Ok(report);
                }
                WriteOutcome::Conflict { current } if attempts <= self.conflict_retries => {
                    warn!(
                        bucket,
                        rule_id = %desired.id,
                        attempts,
                        %current,
                        "lifecycle configuration changed concurrently, retrying"
                    );
                }
                WriteOutcome::Conflict { .. } => {
                    return Err(LifecycleError::Conflict {
                        bucket: bucket.to_owned(),
                        rule_id: desired.id.clone(),
                        attempts,
                    });
                }
            }
        }
    }
}
