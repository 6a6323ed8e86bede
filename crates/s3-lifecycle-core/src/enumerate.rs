//! Bucket enumeration.

use std::sync::Arc;

use tracing::info;

use crate::backend::LifecycleBackend;
use crate::error::LifecycleResult;

/// Lists the buckets a run operates on.
///
/// Every call performs a fresh listing; nothing is filtered or cached.
#[derive(Debug, Clone)]
pub struct BucketEnumerator {
    backend: Arc<dyn LifecycleBackend>,
}

impl BucketEnumerator {
    /// Create an enumerator over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn LifecycleBackend>) -> Self {
        Self { backend }
    }

    /// List every bucket visible to the caller.
    ///
    /// Backend errors are returned unchanged.
    pub async fn list_buckets(&self) -> LifecycleResult<Vec<String>> {
        let buckets = self.backend.list_buckets().await?;
        info!(count = buckets.len(), "enumerated buckets");
        Ok(buckets)
    }
}
