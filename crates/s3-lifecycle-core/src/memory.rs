//! In-memory lifecycle backend.
//!
//! [`InMemoryBackend`] stores each bucket's lifecycle rules in a `DashMap` and
//! honors version tokens atomically on write. It also records every call it
//! receives and can be told to fail specific calls, which makes it the test
//! double for the reconciler and orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use s3_lifecycle_model::LifecycleRule;
use tracing::debug;

use crate::backend::{LifecycleBackend, LifecycleSnapshot, VersionToken, WriteOutcome};
use crate::error::BackendError;

const GET_OPERATION: &str = "GetBucketLifecycleConfiguration";
const PUT_OPERATION: &str = "PutBucketLifecycleConfiguration";

/// Backend calls recorded by [`InMemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `list_buckets`.
    List,
    /// `read_lifecycle`.
    Read,
    /// `write_lifecycle`, counted whether or not it applied.
    Write,
}

/// Thread-safe in-memory lifecycle store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use s3_lifecycle_core::{InMemoryBackend, Reconciler};
/// use s3_lifecycle_model::{DesiredRuleSpec, Outcome};
///
/// # tokio_test::block_on(async {
/// let backend = Arc::new(InMemoryBackend::with_buckets(["logs"]));
/// let reconciler = Reconciler::new(backend.clone());
/// let desired = DesiredRuleSpec::multipart_abort(7).unwrap();
///
/// let report = reconciler.reconcile("logs", &desired).await.unwrap();
/// assert_eq!(report.outcome, Outcome::Created);
/// assert_eq!(backend.rules("logs").unwrap().len(), 1);
/// # });
/// ```
pub struct InMemoryBackend {
    /// Bucket name to lifecycle rules; `None` means no configuration.
    buckets: DashMap<String, Option<Vec<LifecycleRule>>>,
    /// Bucket names in creation order, which is the listing order.
    order: RwLock<Vec<String>>,
    /// Per-bucket call counters. Listing is recorded under the empty name.
    calls: DashMap<(CallKind, String), usize>,
    /// Calls that must fail, keyed like `calls`.
    failures: DashSet<(CallKind, String)>,
    fail_listing: AtomicBool,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("bucket_count", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            order: RwLock::new(Vec::new()),
            calls: DashMap::new(),
            failures: DashSet::new(),
            fail_listing: AtomicBool::new(false),
        }
    }

    /// Create a backend holding the given buckets, none of them configured.
    #[must_use]
    pub fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for name in names {
            backend.insert_bucket(name, None);
        }
        backend
    }

    /// Create or replace a bucket with the given lifecycle rules.
    pub fn insert_bucket(&self, name: impl Into<String>, rules: Option<Vec<LifecycleRule>>) {
        let name = name.into();
        if self.buckets.insert(name.clone(), rules).is_none() {
            self.order.write().push(name);
        }
    }

    /// Replace a bucket's rules directly, bypassing version checks.
    ///
    /// This stands in for another actor editing the bucket.
    pub fn set_rules(&self, name: &str, rules: Vec<LifecycleRule>) {
        if let Some(mut entry) = self.buckets.get_mut(name) {
            *entry = Some(rules);
        }
    }

    /// Current rules of a bucket; `None` if the bucket is missing or has no
    /// lifecycle configuration.
    #[must_use]
    pub fn rules(&self, name: &str) -> Option<Vec<LifecycleRule>> {
        self.buckets.get(name).and_then(|entry| entry.clone())
    }

    /// Make `list_buckets` fail.
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Make calls of `kind` against `bucket` fail.
    pub fn fail_on(&self, kind: CallKind, bucket: impl Into<String>) {
        self.failures.insert((kind, bucket.into()));
    }

    /// Number of calls of `kind` made against `bucket`.
    #[must_use]
    pub fn calls_for(&self, kind: CallKind, bucket: &str) -> usize {
        self.calls
            .get(&(kind, bucket.to_owned()))
            .map_or(0, |count| *count)
    }

    /// Total number of calls of `kind`.
    #[must_use]
    pub fn total_calls(&self, kind: CallKind) -> usize {
        self.calls
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| *entry.value())
            .sum()
    }

    fn record(&self, kind: CallKind, bucket: &str) {
        *self.calls.entry((kind, bucket.to_owned())).or_insert(0) += 1;
    }

    fn injected_failure(&self, kind: CallKind, bucket: &str) -> bool {
        self.failures.contains(&(kind, bucket.to_owned()))
    }
}

#[async_trait]
impl LifecycleBackend for InMemoryBackend {
    async fn list_buckets(&self) -> Result<Vec<String>, BackendError> {
        self.record(CallKind::List, "");
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BackendError::list_buckets("injected ListBuckets failure"));
        }
        Ok(self.order.read().clone())
    }

    async fn read_lifecycle(&self, bucket: &str) -> Result<LifecycleSnapshot, BackendError> {
        self.record(CallKind::Read, bucket);
        if self.injected_failure(CallKind::Read, bucket) {
            return Err(BackendError::bucket(
                GET_OPERATION,
                bucket,
                "injected read failure",
            ));
        }

        let entry = self.buckets.get(bucket).ok_or_else(|| {
            BackendError::bucket(GET_OPERATION, bucket, "NoSuchBucket")
        })?;
        let snapshot = match entry.value() {
            Some(rules) => LifecycleSnapshot::configured(rules.clone()),
            None => LifecycleSnapshot::not_configured(),
        };
        debug!(bucket, rules = snapshot.rules.len(), "read lifecycle configuration");
        Ok(snapshot)
    }

    async fn write_lifecycle(
        &self,
        bucket: &str,
        rules: &[LifecycleRule],
        expected: &VersionToken,
    ) -> Result<WriteOutcome, BackendError> {
        self.record(CallKind::Write, bucket);
        if self.injected_failure(CallKind::Write, bucket) {
            return Err(BackendError::bucket(
                PUT_OPERATION,
                bucket,
                "injected write failure",
            ));
        }

        // Holding the entry lock makes the compare-and-swap atomic.
        let mut entry = self.buckets.get_mut(bucket).ok_or_else(|| {
            BackendError::bucket(PUT_OPERATION, bucket, "NoSuchBucket")
        })?;
        let current = VersionToken::of(entry.as_deref().unwrap_or_default());
        if &current != expected {
            debug!(bucket, "lifecycle version mismatch, rejecting write");
            return Ok(WriteOutcome::Conflict { current });
        }

        *entry = (!rules.is_empty()).then(|| rules.to_vec());
        debug!(bucket, rules = rules.len(), "wrote lifecycle configuration");
        Ok(WriteOutcome::Applied)
    }
}
