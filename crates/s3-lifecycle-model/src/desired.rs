//! Desired-state inputs for a single reconciliation call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{
    AbortIncompleteMultipartUpload, ExpirationStatus, LifecycleRule, LifecycleRuleFilter,
    Transition, TransitionStorageClass,
};

/// Rule id of the managed multipart-abort rule.
pub const MULTIPART_UPLOAD_RULE_ID: &str = "MultipartUploadRule";

/// Rule id of the managed intelligent-tiering transition rule.
pub const INTELLIGENT_TIERING_RULE_ID: &str = "IntelligentTieringRule";

/// Errors raised while building or validating a desired rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// The rule id is empty.
    #[error("rule id must not be empty")]
    EmptyId,

    /// A day count is out of range for the action.
    #[error("{field} must be at least {min}, got {value}")]
    DaysOutOfRange {
        /// Name of the offending parameter.
        field: &'static str,
        /// Smallest accepted value.
        min: i32,
        /// The rejected value.
        value: i32,
    },

    /// A managed rule kind name was not recognized.
    #[error("unknown managed rule kind: {0}")]
    UnknownRuleKind(String),
}

/// The managed action and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DesiredAction {
    /// Abort multipart uploads that are still incomplete after N days.
    #[serde(rename_all = "camelCase")]
    AbortIncompleteUpload {
        /// Days after initiation; at least 1.
        days_after_initiation: i32,
    },
    /// Move objects to `storage_class` after N days.
    #[serde(rename_all = "camelCase")]
    Transition {
        /// Days after creation; at least 0.
        days: i32,
        /// Target tier.
        storage_class: TransitionStorageClass,
    },
}

/// One desired rule, keyed by its stable `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRuleSpec {
    /// Reconciliation key.
    pub id: String,
    /// Action the rule with this id must carry.
    pub action: DesiredAction,
}

impl DesiredRuleSpec {
    /// Build and validate a desired rule.
    pub fn new(id: impl Into<String>, action: DesiredAction) -> Result<Self, SpecError> {
        let spec = Self {
            id: id.into(),
            action,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// The managed multipart-abort rule with the given day count.
    pub fn multipart_abort(days_after_initiation: i32) -> Result<Self, SpecError> {
        Self::new(
            MULTIPART_UPLOAD_RULE_ID,
            DesiredAction::AbortIncompleteUpload {
                days_after_initiation,
            },
        )
    }

    /// The managed intelligent-tiering rule with the given day count.
    pub fn intelligent_tiering(days: i32) -> Result<Self, SpecError> {
        Self::new(
            INTELLIGENT_TIERING_RULE_ID,
            DesiredAction::Transition {
                days,
                storage_class: TransitionStorageClass::IntelligentTiering,
            },
        )
    }

    /// Check the id and the day-count bounds of the action.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.id.is_empty() {
            return Err(SpecError::EmptyId);
        }
        match self.action {
            DesiredAction::AbortIncompleteUpload {
                days_after_initiation,
            } if days_after_initiation < 1 => Err(SpecError::DaysOutOfRange {
                field: "daysAfterInitiation",
                min: 1,
                value: days_after_initiation,
            }),
            DesiredAction::Transition { days, .. } if days < 0 => {
                Err(SpecError::DaysOutOfRange {
                    field: "days",
                    min: 0,
                    value: days,
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether `rule` already carries exactly this action's parameters.
    ///
    /// Only the managed parameter is compared; status, filter and unrelated
    /// actions are ignored.
    #[must_use]
    pub fn is_satisfied_by(&self, rule: &LifecycleRule) -> bool {
        match &self.action {
            DesiredAction::AbortIncompleteUpload {
                days_after_initiation,
            } => {
                rule.abort_incomplete_multipart_upload
                    .as_ref()
                    .and_then(|abort| abort.days_after_initiation)
                    == Some(*days_after_initiation)
            }
            DesiredAction::Transition {
                days,
                storage_class,
            } => rule.transitions.first().is_some_and(|t| {
                t.date.is_none()
                    && t.days == Some(*days)
                    && t.storage_class.as_ref() == Some(storage_class)
            }),
        }
    }

    /// Overwrite the managed parameter of `rule`, leaving every other field
    /// alone.
    ///
    /// For transitions only the first entry is rewritten; one is appended if
    /// the rule has none.
    pub fn apply_to(&self, rule: &mut LifecycleRule) {
        match &self.action {
            DesiredAction::AbortIncompleteUpload {
                days_after_initiation,
            } => {
                rule.abort_incomplete_multipart_upload
                    .get_or_insert_with(AbortIncompleteMultipartUpload::default)
                    .days_after_initiation = Some(*days_after_initiation);
            }
            DesiredAction::Transition {
                days,
                storage_class,
            } => {
                if rule.transitions.is_empty() {
                    rule.transitions.push(Transition::default());
                }
                if let Some(first) = rule.transitions.first_mut() {
                    first.date = None;
                    first.days = Some(*days);
                    first.storage_class = Some(storage_class.clone());
                }
            }
        }
    }

    /// A fresh, enabled, whole-bucket rule carrying this action.
    #[must_use]
    pub fn to_rule(&self) -> LifecycleRule {
        let mut rule = LifecycleRule {
            id: Some(self.id.clone()),
            status: ExpirationStatus::Enabled,
            filter: Some(LifecycleRuleFilter::whole_bucket()),
            ..LifecycleRule::default()
        };
        self.apply_to(&mut rule);
        rule
    }
}

/// The rule kinds this system manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManagedRuleKind {
    /// `MultipartUploadRule`: abort incomplete multipart uploads.
    MultipartAbort,
    /// `IntelligentTieringRule`: transition to `INTELLIGENT_TIERING`.
    IntelligentTiering,
}

impl ManagedRuleKind {
    /// Every managed kind, in reconciliation order.
    pub const ALL: [Self; 2] = [Self::MultipartAbort, Self::IntelligentTiering];

    /// Returns the string value of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipartAbort => "multipart-abort",
            Self::IntelligentTiering => "intelligent-tiering",
        }
    }

    /// Stable rule id for this kind.
    #[must_use]
    pub fn rule_id(self) -> &'static str {
        match self {
            Self::MultipartAbort => MULTIPART_UPLOAD_RULE_ID,
            Self::IntelligentTiering => INTELLIGENT_TIERING_RULE_ID,
        }
    }

    /// Build the desired rule for this kind with the given day count.
    pub fn desired(self, days: i32) -> Result<DesiredRuleSpec, SpecError> {
        match self {
            Self::MultipartAbort => DesiredRuleSpec::multipart_abort(days),
            Self::IntelligentTiering => DesiredRuleSpec::intelligent_tiering(days),
        }
    }
}

impl fmt::Display for ManagedRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManagedRuleKind {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multipart-abort" | "multipart" | MULTIPART_UPLOAD_RULE_ID => Ok(Self::MultipartAbort),
            "intelligent-tiering" | "tiering" | INTELLIGENT_TIERING_RULE_ID => {
                Ok(Self::IntelligentTiering)
            }
            other => Err(SpecError::UnknownRuleKind(other.to_owned())),
        }
    }
}
