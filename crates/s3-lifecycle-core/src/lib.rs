//! Lifecycle policy reconciliation for s3-lifecycle.
//!
//! This crate brings the lifecycle configuration of every bucket into
//! agreement with a small set of managed rules, without touching rules owned
//! by anyone else.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator (per run)
//!        |
//!        +--> BucketEnumerator --> list_buckets
//!        |
//!        v
//!   Reconciler (per bucket, per rule)
//!        |   read -> reconcile_rules -> conditional write
//!        v
//!   dyn LifecycleBackend (aws-sdk-s3, in-memory)
//! ```

pub mod backend;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod event;
pub mod memory;
pub mod orchestrator;
pub mod reconcile;

pub use backend::{LifecycleBackend, LifecycleSnapshot, VersionToken, WriteOutcome};
pub use config::LifecycleConfig;
pub use enumerate::BucketEnumerator;
pub use error::{BackendError, LifecycleError, LifecycleResult};
pub use event::{InvocationEvent, InvocationResponse};
pub use memory::InMemoryBackend;
pub use orchestrator::{Orchestrator, RunObserver, RunSummary};
pub use reconcile::{ReconcileReport, Reconciler, reconcile_rules};
