//! AWS S3 lifecycle backend for s3-lifecycle.
//!
//! Implements [`s3_lifecycle_core::LifecycleBackend`] with `aws-sdk-s3` and
//! converts between the SDK's lifecycle shapes and the model crate.

pub mod backend;
pub mod convert;

pub use backend::AwsLifecycleBackend;
pub use convert::{ConversionError, rule_from_sdk, rule_to_sdk};
