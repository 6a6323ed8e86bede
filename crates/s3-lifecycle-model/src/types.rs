//! S3 lifecycle configuration shapes.
//!
//! These mirror the `LifecycleRule` shape of the S3 API field for field, so a
//! rule read from a bucket can be written back without losing anything the
//! reconciler does not manage.

use serde::{Deserialize, Serialize};

/// S3 ExpirationStatus enum.
///
/// A status this model does not know is kept in [`Self::Other`] and written
/// back as read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExpirationStatus {
    /// Default variant.
    #[default]
    Disabled,
    Enabled,
    Other(String),
}

impl ExpirationStatus {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disabled => "Disabled",
            Self::Enabled => "Enabled",
            Self::Other(value) => value,
        }
    }
}

impl std::fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ExpirationStatus {
    fn from(s: &str) -> Self {
        match s {
            "Disabled" => Self::Disabled,
            "Enabled" => Self::Enabled,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for ExpirationStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ExpirationStatus> for String {
    fn from(value: ExpirationStatus) -> Self {
        match value {
            ExpirationStatus::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

/// S3 TransitionStorageClass enum.
///
/// Values the service may add later are kept verbatim in [`Self::Other`] so
/// that rules owned by other tooling round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitionStorageClass {
    DeepArchive,
    Glacier,
    GlacierIr,
    IntelligentTiering,
    OnezoneIa,
    StandardIa,
    Other(String),
}

impl TransitionStorageClass {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::DeepArchive => "DEEP_ARCHIVE",
            Self::Glacier => "GLACIER",
            Self::GlacierIr => "GLACIER_IR",
            Self::IntelligentTiering => "INTELLIGENT_TIERING",
            Self::OnezoneIa => "ONEZONE_IA",
            Self::StandardIa => "STANDARD_IA",
            Self::Other(value) => value,
        }
    }
}

impl std::fmt::Display for TransitionStorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TransitionStorageClass {
    fn from(s: &str) -> Self {
        match s {
            "DEEP_ARCHIVE" => Self::DeepArchive,
            "GLACIER" => Self::Glacier,
            "GLACIER_IR" => Self::GlacierIr,
            "INTELLIGENT_TIERING" => Self::IntelligentTiering,
            "ONEZONE_IA" => Self::OnezoneIa,
            "STANDARD_IA" => Self::StandardIa,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for TransitionStorageClass {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<TransitionStorageClass> for String {
    fn from(value: TransitionStorageClass) -> Self {
        match value {
            TransitionStorageClass::Other(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

/// S3 AbortIncompleteMultipartUpload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortIncompleteMultipartUpload {
    pub days_after_initiation: Option<i32>,
}

/// S3 Tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// S3 LifecycleExpiration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleExpiration {
    pub date: Option<chrono::DateTime<chrono::Utc>>,
    pub days: Option<i32>,
    pub expired_object_delete_marker: Option<bool>,
}

/// S3 LifecycleRuleAndOperator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRuleAndOperator {
    pub object_size_greater_than: Option<i64>,
    pub object_size_less_than: Option<i64>,
    pub prefix: Option<String>,
    pub tags: Vec<Tag>,
}

/// S3 LifecycleRuleFilter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRuleFilter {
    pub and: Option<LifecycleRuleAndOperator>,
    pub object_size_greater_than: Option<i64>,
    pub object_size_less_than: Option<i64>,
    pub prefix: Option<String>,
    pub tag: Option<Tag>,
}

impl LifecycleRuleFilter {
    /// A filter that selects every object in the bucket (`<Prefix></Prefix>`).
    #[must_use]
    pub fn whole_bucket() -> Self {
        Self {
            prefix: Some(String::new()),
            ..Self::default()
        }
    }
}

/// S3 NoncurrentVersionExpiration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoncurrentVersionExpiration {
    pub newer_noncurrent_versions: Option<i32>,
    pub noncurrent_days: Option<i32>,
}

/// S3 NoncurrentVersionTransition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoncurrentVersionTransition {
    pub newer_noncurrent_versions: Option<i32>,
    pub noncurrent_days: Option<i32>,
    pub storage_class: Option<TransitionStorageClass>,
}

/// S3 Transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub date: Option<chrono::DateTime<chrono::Utc>>,
    pub days: Option<i32>,
    pub storage_class: Option<TransitionStorageClass>,
}

/// S3 LifecycleRule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    pub abort_incomplete_multipart_upload: Option<AbortIncompleteMultipartUpload>,
    pub expiration: Option<LifecycleExpiration>,
    pub filter: Option<LifecycleRuleFilter>,
    pub id: Option<String>,
    pub noncurrent_version_expiration: Option<NoncurrentVersionExpiration>,
    pub noncurrent_version_transitions: Vec<NoncurrentVersionTransition>,
    /// Legacy top-level prefix, superseded by `filter` but still returned for
    /// rules created through the old API.
    pub prefix: Option<String>,
    pub status: ExpirationStatus,
    pub transitions: Vec<Transition>,
}

impl LifecycleRule {
    /// Whether this rule carries the given id.
    #[must_use]
    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_known_storage_classes() {
        for value in [
            "DEEP_ARCHIVE",
            "GLACIER",
            "GLACIER_IR",
            "INTELLIGENT_TIERING",
            "ONEZONE_IA",
            "STANDARD_IA",
        ] {
            let class = TransitionStorageClass::from(value);
            assert!(!matches!(class, TransitionStorageClass::Other(_)));
            assert_eq!(class.as_str(), value);
        }
    }

    #[test]
    fn test_should_preserve_unknown_storage_class() {
        let class = TransitionStorageClass::from("EXPRESS_ONEZONE");
        assert_eq!(
            class,
            TransitionStorageClass::Other("EXPRESS_ONEZONE".to_owned())
        );
        assert_eq!(String::from(class), "EXPRESS_ONEZONE");
    }

    #[test]
    fn test_should_serialize_storage_class_as_wire_string() {
        let json = serde_json::to_string(&TransitionStorageClass::IntelligentTiering)
            .expect("test serialization");
        assert_eq!(json, "\"INTELLIGENT_TIERING\"");
    }

    #[test]
    fn test_should_parse_expiration_status() {
        assert_eq!(ExpirationStatus::from("Enabled"), ExpirationStatus::Enabled);
        assert_eq!(
            ExpirationStatus::from("Disabled"),
            ExpirationStatus::Disabled
        );
        assert_eq!(ExpirationStatus::default().to_string(), "Disabled");
    }

    #[test]
    fn test_should_preserve_unknown_expiration_status() {
        let status = ExpirationStatus::from("Suspended");
        assert_eq!(status, ExpirationStatus::Other("Suspended".to_owned()));
        assert_eq!(status.as_str(), "Suspended");

        let json = serde_json::to_string(&status).expect("test serialization");
        assert_eq!(json, "\"Suspended\"");
        let back: ExpirationStatus = serde_json::from_str(&json).expect("test deserialization");
        assert_eq!(back, status);
    }

    #[test]
    fn test_should_build_whole_bucket_filter() {
        let filter = LifecycleRuleFilter::whole_bucket();
        assert_eq!(filter.prefix.as_deref(), Some(""));
        assert!(filter.tag.is_none());
        assert!(filter.and.is_none());
    }

    #[test]
    fn test_should_match_rule_id() {
        let rule = LifecycleRule {
            id: Some("keep-logs".to_owned()),
            ..LifecycleRule::default()
        };
        assert!(rule.has_id("keep-logs"));
        assert!(!rule.has_id("other"));
        assert!(!LifecycleRule::default().has_id(""));
    }
}
