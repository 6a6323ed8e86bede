//! Conversions between `aws-sdk-s3` lifecycle types and the model.
//!
//! Every field the S3 API returns is carried over in both directions, so a
//! rule the reconciler does not manage is written back exactly as it was read.

use aws_sdk_s3::error::BuildError;
use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types as sdk;
use s3_lifecycle_model::{
    AbortIncompleteMultipartUpload, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleAndOperator, LifecycleRuleFilter, NoncurrentVersionExpiration,
    NoncurrentVersionTransition, Tag, Transition, TransitionStorageClass,
};

/// A lifecycle rule could not be converted.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// An SDK builder rejected the shape (missing required field).
    #[error("cannot build SDK lifecycle shape: {0}")]
    Build(#[from] BuildError),

    /// A timestamp does not fit the model's date range.
    #[error("lifecycle date out of range: {0} seconds since epoch")]
    DateOutOfRange(i64),
}

// ---------------------------------------------------------------------------
// SDK -> model
// ---------------------------------------------------------------------------

/// Convert a rule returned by `GetBucketLifecycleConfiguration`.
pub fn rule_from_sdk(rule: &sdk::LifecycleRule) -> Result<LifecycleRule, ConversionError> {
    #[allow(deprecated)]
    let prefix = rule.prefix().map(ToOwned::to_owned);

    Ok(LifecycleRule {
        abort_incomplete_multipart_upload: rule.abort_incomplete_multipart_upload().map(|abort| {
            AbortIncompleteMultipartUpload {
                days_after_initiation: abort.days_after_initiation(),
            }
        }),
        expiration: rule.expiration().map(expiration_from_sdk).transpose()?,
        filter: rule.filter().map(filter_from_sdk),
        id: rule.id().map(ToOwned::to_owned),
        noncurrent_version_expiration: rule.noncurrent_version_expiration().map(|expiration| {
            NoncurrentVersionExpiration {
                newer_noncurrent_versions: expiration.newer_noncurrent_versions(),
                noncurrent_days: expiration.noncurrent_days(),
            }
        }),
        noncurrent_version_transitions: rule
            .noncurrent_version_transitions()
            .iter()
            .map(|transition| NoncurrentVersionTransition {
                newer_noncurrent_versions: transition.newer_noncurrent_versions(),
                noncurrent_days: transition.noncurrent_days(),
                storage_class: transition.storage_class().map(storage_class_from_sdk),
            })
            .collect(),
        prefix,
        status: ExpirationStatus::from(rule.status().as_str()),
        transitions: rule
            .transitions()
            .iter()
            .map(transition_from_sdk)
            .collect::<Result<_, _>>()?,
    })
}

fn expiration_from_sdk(
    expiration: &sdk::LifecycleExpiration,
) -> Result<LifecycleExpiration, ConversionError> {
    Ok(LifecycleExpiration {
        date: expiration.date().map(date_from_sdk).transpose()?,
        days: expiration.days(),
        expired_object_delete_marker: expiration.expired_object_delete_marker(),
    })
}

fn filter_from_sdk(filter: &sdk::LifecycleRuleFilter) -> LifecycleRuleFilter {
    LifecycleRuleFilter {
        and: filter.and().map(|and| LifecycleRuleAndOperator {
            object_size_greater_than: and.object_size_greater_than(),
            object_size_less_than: and.object_size_less_than(),
            prefix: and.prefix().map(ToOwned::to_owned),
            tags: and.tags().iter().map(tag_from_sdk).collect(),
        }),
        object_size_greater_than: filter.object_size_greater_than(),
        object_size_less_than: filter.object_size_less_than(),
        prefix: filter.prefix().map(ToOwned::to_owned),
        tag: filter.tag().map(tag_from_sdk),
    }
}

fn tag_from_sdk(tag: &sdk::Tag) -> Tag {
    Tag {
        key: tag.key().to_owned(),
        value: tag.value().to_owned(),
    }
}

fn transition_from_sdk(transition: &sdk::Transition) -> Result<Transition, ConversionError> {
    Ok(Transition {
        date: transition.date().map(date_from_sdk).transpose()?,
        days: transition.days(),
        storage_class: transition.storage_class().map(storage_class_from_sdk),
    })
}

fn storage_class_from_sdk(class: &sdk::TransitionStorageClass) -> TransitionStorageClass {
    TransitionStorageClass::from(class.as_str())
}

fn date_from_sdk(date: &DateTime) -> Result<chrono::DateTime<chrono::Utc>, ConversionError> {
    chrono::DateTime::from_timestamp(date.secs(), date.subsec_nanos())
        .ok_or(ConversionError::DateOutOfRange(date.secs()))
}

// ---------------------------------------------------------------------------
// model -> SDK
// ---------------------------------------------------------------------------

/// Convert a rule for `PutBucketLifecycleConfiguration`.
pub fn rule_to_sdk(rule: &LifecycleRule) -> Result<sdk::LifecycleRule, ConversionError> {
    #[allow(deprecated)]
    let builder = sdk::LifecycleRule::builder().set_prefix(rule.prefix.clone());

    let built = builder
        .set_abort_incomplete_multipart_upload(rule.abort_incomplete_multipart_upload.as_ref().map(
            |abort| {
                sdk::AbortIncompleteMultipartUpload::builder()
                    .set_days_after_initiation(abort.days_after_initiation)
                    .build()
            },
        ))
        .set_expiration(rule.expiration.as_ref().map(expiration_to_sdk))
        .set_filter(rule.filter.as_ref().map(filter_to_sdk).transpose()?)
        .set_id(rule.id.clone())
        .set_noncurrent_version_expiration(rule.noncurrent_version_expiration.as_ref().map(
            |expiration| {
                sdk::NoncurrentVersionExpiration::builder()
                    .set_newer_noncurrent_versions(expiration.newer_noncurrent_versions)
                    .set_noncurrent_days(expiration.noncurrent_days)
                    .build()
            },
        ))
        .set_noncurrent_version_transitions(non_empty(
            rule.noncurrent_version_transitions
                .iter()
                .map(|transition| {
                    sdk::NoncurrentVersionTransition::builder()
                        .set_newer_noncurrent_versions(transition.newer_noncurrent_versions)
                        .set_noncurrent_days(transition.noncurrent_days)
                        .set_storage_class(transition.storage_class.as_ref().map(storage_class_to_sdk))
                        .build()
                })
                .collect(),
        ))
        .status(sdk::ExpirationStatus::from(rule.status.as_str()))
        .set_transitions(non_empty(rule.transitions.iter().map(transition_to_sdk).collect()))
        .build()?;

    Ok(built)
}

fn expiration_to_sdk(expiration: &LifecycleExpiration) -> sdk::LifecycleExpiration {
    sdk::LifecycleExpiration::builder()
        .set_date(expiration.date.as_ref().map(date_to_sdk))
        .set_days(expiration.days)
        .set_expired_object_delete_marker(expiration.expired_object_delete_marker)
        .build()
}

fn filter_to_sdk(filter: &LifecycleRuleFilter) -> Result<sdk::LifecycleRuleFilter, ConversionError> {
    let and = filter
        .and
        .as_ref()
        .map(|and| -> Result<_, ConversionError> {
            Ok(sdk::LifecycleRuleAndOperator::builder()
                .set_object_size_greater_than(and.object_size_greater_than)
                .set_object_size_less_than(and.object_size_less_than)
                .set_prefix(and.prefix.clone())
                .set_tags(non_empty(
                    and.tags.iter().map(tag_to_sdk).collect::<Result<_, _>>()?,
                ))
                .build())
        })
        .transpose()?;

    Ok(sdk::LifecycleRuleFilter::builder()
        .set_and(and)
        .set_object_size_greater_than(filter.object_size_greater_than)
        .set_object_size_less_than(filter.object_size_less_than)
        .set_prefix(filter.prefix.clone())
        .set_tag(filter.tag.as_ref().map(tag_to_sdk).transpose()?)
        .build())
}

fn tag_to_sdk(tag: &Tag) -> Result<sdk::Tag, ConversionError> {
    Ok(sdk::Tag::builder()
        .key(tag.key.clone())
        .value(tag.value.clone())
        .build()?)
}

fn transition_to_sdk(transition: &Transition) -> sdk::Transition {
    sdk::Transition::builder()
        .set_date(transition.date.as_ref().map(date_to_sdk))
        .set_days(transition.days)
        .set_storage_class(transition.storage_class.as_ref().map(storage_class_to_sdk))
        .build()
}

fn storage_class_to_sdk(class: &TransitionStorageClass) -> sdk::TransitionStorageClass {
    sdk::TransitionStorageClass::from(class.as_str())
}

fn date_to_sdk(date: &chrono::DateTime<chrono::Utc>) -> DateTime {
    DateTime::from_secs_and_nanos(date.timestamp(), date.timestamp_subsec_nanos())
}

/// Empty lists are omitted from the request rather than sent as empty elements.
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}
