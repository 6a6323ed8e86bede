//! Serverless invocation payloads.
//!
//! [`InvocationEvent`] is the optional JSON event a scheduled or manual
//! invocation carries; it overrides the deployment's [`LifecycleConfig`].
//! [`InvocationResponse`] is the structured result returned on success.

use s3_lifecycle_model::ManagedRuleKind;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::orchestrator::RunSummary;

/// Overrides carried by an invocation event.
///
/// Unknown fields are ignored, so scheduler envelopes deserialize to an empty
/// set of overrides. Day counts may be JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    /// Day count for the single selected rule kind.
    #[serde(default, deserialize_with = "lenient_days")]
    pub days: Option<i32>,
    /// Day count for the multipart-abort rule.
    #[serde(default, deserialize_with = "lenient_days")]
    pub multipart_abort_days: Option<i32>,
    /// Day count for the intelligent-tiering rule.
    #[serde(default, deserialize_with = "lenient_days")]
    pub tiering_days: Option<i32>,
    /// Rule kinds to reconcile in this invocation.
    #[serde(default)]
    pub rules: Option<Vec<ManagedRuleKind>>,
    /// Decide and report without writing.
    #[serde(default)]
    pub dry_run: Option<bool>,
    /// Log and skip failing buckets instead of aborting.
    #[serde(default)]
    pub continue_on_error: Option<bool>,
}

impl InvocationEvent {
    /// Interpret a raw event payload. `null` means no overrides.
    pub fn from_value(value: serde_json::Value) -> LifecycleResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| LifecycleError::InvalidEvent(e.to_string()))
    }

    /// Layer this event over `base`.
    ///
    /// `days` sets the day count of the one selected rule kind. With several
    /// kinds selected it is ambiguous and rejected unless every kind also has
    /// its own field.
    pub fn apply(&self, base: &LifecycleConfig) -> LifecycleResult<LifecycleConfig> {
        let mut config = base.clone();

        if let Some(rules) = &self.rules {
            let mut selected: Vec<ManagedRuleKind> = Vec::with_capacity(rules.len());
            for kind in rules {
                if !selected.contains(kind) {
                    selected.push(*kind);
                }
            }
            config.managed_rules = selected;
        }

        if let Some(days) = self.days {
            match config.managed_rules.as_slice() {
                [kind] => match kind {
                    ManagedRuleKind::MultipartAbort => config.multipart_abort_days = days,
                    ManagedRuleKind::IntelligentTiering => config.tiering_days = days,
                },
                _ if self.multipart_abort_days.is_some() && self.tiering_days.is_some() => {}
                _ => {
                    return Err(LifecycleError::InvalidEvent(
                        "`days` is ambiguous when several rules are selected; use \
                         `multipartAbortDays` / `tieringDays` or select one rule"
                            .to_owned(),
                    ));
                }
            }
        }
        if let Some(days) = self.multipart_abort_days {
            config.multipart_abort_days = days;
        }
        if let Some(days) = self.tiering_days {
            config.tiering_days = days;
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if let Some(continue_on_error) = self.continue_on_error {
            config.continue_on_error = continue_on_error;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Structured result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// Always `200` on success.
    pub status_code: u16,
    /// `"Rules applied to N buckets."`
    pub body: String,
}

impl InvocationResponse {
    /// Response for a completed run.
    #[must_use]
    pub fn ok(summary: &RunSummary) -> Self {
        Self {
            status_code: 200,
            body: summary.message(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Float(f64),
    Text(String),
}

fn lenient_days<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<NumberOrString>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let value = match raw {
        NumberOrString::Number(n) => n,
        NumberOrString::Float(f) => integral(f).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a whole day count, got {f}"))
        })?,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a day count, got {s:?}")))?,
    };
    i32::try_from(value)
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("day count out of range: {value}")))
}

/// `30.0` counts as 30 days; fractions and out-of-range values do not.
#[allow(clippy::cast_possible_truncation)]
fn integral(value: f64) -> Option<i64> {
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    (in_range && value.fract().abs() < f64::EPSILON).then_some(value as i64)
}
