//! Lifecycle rule model for s3-lifecycle.
//!
//! [`types`] mirrors the S3 lifecycle configuration shapes; [`desired`]
//! describes the rules this system manages and how a rule is compared against
//! and brought to the desired parameters; [`outcome`] is what a single
//! reconciliation reports.

pub mod desired;
pub mod outcome;
#[allow(missing_docs)]
pub mod types;

pub use desired::{
    DesiredAction, DesiredRuleSpec, INTELLIGENT_TIERING_RULE_ID, MULTIPART_UPLOAD_RULE_ID,
    ManagedRuleKind, SpecError,
};
pub use outcome::Outcome;
pub use types::{
    AbortIncompleteMultipartUpload, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleAndOperator, LifecycleRuleFilter, NoncurrentVersionExpiration,
    NoncurrentVersionTransition, Tag, Transition, TransitionStorageClass,
};
