//! Storage backend seam.
//!
//! The reconciler never talks to S3 directly. It goes through
//! [`LifecycleBackend`], a two-phase contract: [`LifecycleBackend::read_lifecycle`]
//! returns the current rules together with a [`VersionToken`], and
//! [`LifecycleBackend::write_lifecycle`] replaces the rules only if the caller's
//! token still matches. Backends without conditional writes decide themselves
//! how closely they can honor the token.
//!
//! The trait uses `#[async_trait]` so it can be held as
//! `Arc<dyn LifecycleBackend>`.

use std::fmt;

use async_trait::async_trait;
use s3_lifecycle_model::LifecycleRule;
use sha2::{Digest, Sha256};

use crate::error::BackendError;

/// Opaque version of a bucket's lifecycle configuration.
///
/// Derived from the content of the rule list, so two reads of an unchanged
/// configuration produce equal tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Compute the token of a rule list.
    ///
    /// A bucket without any lifecycle configuration hashes as the empty list.
    #[must_use]
    pub fn of(rules: &[LifecycleRule]) -> Self {
        // Serializing plain data structs into a Vec cannot fail.
        let canonical = serde_json::to_vec(rules).unwrap_or_default();
        Self(hex::encode(Sha256::digest(&canonical)))
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bucket's lifecycle rules as read from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSnapshot {
    /// Current rules, in backend order. Empty when nothing is configured.
    pub rules: Vec<LifecycleRule>,
    /// Version of `rules` to hand back on write.
    pub version: VersionToken,
    /// Whether the bucket had a lifecycle configuration at all.
    pub configured: bool,
}

impl LifecycleSnapshot {
    /// Snapshot of a configured bucket.
    #[must_use]
    pub fn configured(rules: Vec<LifecycleRule>) -> Self {
        let version = VersionToken::of(&rules);
        Self {
            rules,
            version,
            configured: true,
        }
    }

    /// Snapshot of a bucket without lifecycle configuration.
    #[must_use]
    pub fn not_configured() -> Self {
        Self {
            rules: Vec::new(),
            version: VersionToken::of(&[]),
            configured: false,
        }
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The rules were stored.
    Applied,
    /// The stored configuration no longer matches the expected version; nothing
    /// was written.
    Conflict {
        /// Version found at write time.
        current: VersionToken,
    },
}

/// Object-storage operations the reconciler depends on.
#[async_trait]
pub trait LifecycleBackend: Send + Sync + fmt::Debug {
    /// List the names of every bucket visible to the caller.
    async fn list_buckets(&self) -> Result<Vec<String>, BackendError>;

    /// Read a bucket's lifecycle rules.
    ///
    /// A bucket without lifecycle configuration is reported as
    /// [`LifecycleSnapshot::not_configured`], not as an error.
    async fn read_lifecycle(&self, bucket: &str) -> Result<LifecycleSnapshot, BackendError>;

    /// Replace a bucket's lifecycle rules wholesale, provided the stored
    /// configuration still has version `expected`.
    ///
    /// An empty `rules` removes the configuration, after which the bucket
    /// reads as [`LifecycleSnapshot::not_configured`]. Bucket-level settings
    /// stored alongside the rules are left as they are.
    async fn write_lifecycle(
        &self,
        bucket: &str,
        rules: &[LifecycleRule],
        expected: &VersionToken,
    ) -> Result<WriteOutcome, BackendError>;
}
