//! Error types for lifecycle reconciliation.
//!
//! [`BackendError`] is what a [`crate::backend::LifecycleBackend`] reports when
//! a storage call fails. [`LifecycleError`] is the error surface of the
//! reconciler, enumerator and orchestrator; backend errors pass through it
//! unchanged.

use s3_lifecycle_model::SpecError;

/// Boxed source error carried by [`BackendError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A storage backend call failed.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Listing buckets failed.
    #[error("ListBuckets failed: {source}")]
    ListBuckets {
        /// Underlying SDK or transport error.
        #[source]
        source: BoxError,
    },

    /// A per-bucket call failed.
    #[error("{operation} failed for bucket {bucket}: {source}")]
    Bucket {
        /// Operation name, e.g. `GetBucketLifecycleConfiguration`.
        operation: &'static str,
        /// Bucket the call targeted.
        bucket: String,
        /// Underlying SDK or transport error.
        #[source]
        source: BoxError,
    },

    /// The backend returned a rule that cannot be represented, or a rule
    /// collection that cannot be sent.
    #[error("invalid lifecycle configuration for bucket {bucket}: {message}")]
    InvalidConfiguration {
        /// Bucket the configuration belongs to.
        bucket: String,
        /// What was wrong with it.
        message: String,
    },
}

impl BackendError {
    /// Wrap a per-bucket call failure.
    pub fn bucket(
        operation: &'static str,
        bucket: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Bucket {
            operation,
            bucket: bucket.into(),
            source: source.into(),
        }
    }

    /// Wrap a bucket-listing failure.
    pub fn list_buckets(source: impl Into<BoxError>) -> Self {
        Self::ListBuckets {
            source: source.into(),
        }
    }
}

/// Error type for reconciliation runs.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A backend call failed; the run is aborted unless per-bucket isolation
    /// is enabled.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The bucket's configuration kept changing between read and write.
    #[error(
        "lifecycle configuration of bucket {bucket} changed concurrently while reconciling {rule_id} ({attempts} attempts)"
    )]
    Conflict {
        /// Bucket being reconciled.
        bucket: String,
        /// Rule being reconciled.
        rule_id: String,
        /// Number of read/write attempts made.
        attempts: u32,
    },

    /// A desired rule is invalid.
    #[error("invalid desired rule: {0}")]
    InvalidSpec(#[from] SpecError),

    /// An invocation event payload could not be interpreted.
    #[error("invalid invocation event: {0}")]
    InvalidEvent(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
