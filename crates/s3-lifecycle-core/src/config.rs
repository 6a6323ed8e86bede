//! Run configuration.
//!
//! Provides [`LifecycleConfig`], the parameters of one reconciliation run.
//! Values come from defaults, environment variables, CLI flags, or an
//! invocation event, in that order of precedence from lowest to highest.

use s3_lifecycle_model::{DesiredRuleSpec, ManagedRuleKind};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{LifecycleError, LifecycleResult};

/// Default day count for the multipart-abort rule.
pub const DEFAULT_MULTIPART_ABORT_DAYS: i32 = 7;

/// Default day count for the intelligent-tiering rule.
pub const DEFAULT_TIERING_DAYS: i32 = 30;

/// Parameters of a reconciliation run.
///
/// # Examples
///
/// ```
/// use s3_lifecycle_core::config::LifecycleConfig;
///
/// let config = LifecycleConfig::default();
/// assert_eq!(config.multipart_abort_days, 7);
/// assert_eq!(config.tiering_days, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleConfig {
    /// Days after initiation before incomplete multipart uploads are aborted.
    #[builder(default = DEFAULT_MULTIPART_ABORT_DAYS)]
    pub multipart_abort_days: i32,

    /// Days after creation before objects move to intelligent tiering.
    #[builder(default = DEFAULT_TIERING_DAYS)]
    pub tiering_days: i32,

    /// Rule kinds reconciled on every bucket, in order.
    #[builder(default = ManagedRuleKind::ALL.to_vec())]
    pub managed_rules: Vec<ManagedRuleKind>,

    /// Log and skip a failing bucket instead of aborting the run.
    #[builder(default = false)]
    pub continue_on_error: bool,

    /// Decide and report without writing.
    #[builder(default = false)]
    pub dry_run: bool,

    /// How many times a reconciliation is re-read and re-decided after a
    /// concurrent modification.
    #[builder(default = 2)]
    pub conflict_retries: u32,

    /// Re-read the configuration right before writing and skip the write if it
    /// changed.
    #[builder(default = true)]
    pub verify_before_write: bool,

    /// Custom S3 endpoint (S3-compatible servers, local emulators).
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Use path-style bucket addressing.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            multipart_abort_days: DEFAULT_MULTIPART_ABORT_DAYS,
            tiering_days: DEFAULT_TIERING_DAYS,
            managed_rules: ManagedRuleKind::ALL.to_vec(),
            continue_on_error: false,
            dry_run: false,
            conflict_retries: 2,
            verify_before_write: true,
            endpoint_url: None,
            force_path_style: false,
            log_level: String::from("info"),
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MULTIPART_ABORT_DAYS` | `7` |
    /// | `TIERING_DAYS` | `30` |
    /// | `MANAGED_RULES` | `multipart-abort,intelligent-tiering` |
    /// | `CONTINUE_ON_ERROR` | `false` |
    /// | `DRY_RUN` | `false` |
    /// | `CONFLICT_RETRIES` | `2` |
    /// | `VERIFY_BEFORE_WRITE` | `true` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Config`] if a numeric variable or
    /// `MANAGED_RULES` cannot be parsed.
    pub fn from_env() -> LifecycleResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("MULTIPART_ABORT_DAYS") {
            config.multipart_abort_days = parse_number("MULTIPART_ABORT_DAYS", &v)?;
        }
        if let Ok(v) = std::env::var("TIERING_DAYS") {
            config.tiering_days = parse_number("TIERING_DAYS", &v)?;
        }
        if let Ok(v) = std::env::var("MANAGED_RULES") {
            config.managed_rules = parse_rule_kinds(&v)?;
        }
        if let Ok(v) = std::env::var("CONTINUE_ON_ERROR") {
            config.continue_on_error = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("DRY_RUN") {
            config.dry_run = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("CONFLICT_RETRIES") {
            config.conflict_retries = parse_number("CONFLICT_RETRIES", &v)?;
        }
        if let Ok(v) = std::env::var("VERIFY_BEFORE_WRITE") {
            config.verify_before_write = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
            config.endpoint_url = Some(v).filter(|url| !url.is_empty());
        }
        if let Ok(v) = std::env::var("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// Check day bounds and that at least one rule kind is selected.
    pub fn validate(&self) -> LifecycleResult<()> {
        if self.managed_rules.is_empty() {
            return Err(LifecycleError::Config(
                "at least one managed rule kind must be selected".to_owned(),
            ));
        }
        self.desired_rules().map(|_| ())
    }

    /// Day count configured for `kind`.
    #[must_use]
    pub fn days_for(&self, kind: ManagedRuleKind) -> i32 {
        match kind {
            ManagedRuleKind::MultipartAbort => self.multipart_abort_days,
            ManagedRuleKind::IntelligentTiering => self.tiering_days,
        }
    }

    /// The desired rules of this run, one per selected kind, in order.
    pub fn desired_rules(&self) -> LifecycleResult<Vec<DesiredRuleSpec>> {
        self.managed_rules
            .iter()
            .map(|kind| kind.desired(self.days_for(*kind)).map_err(Into::into))
            .collect()
    }
}

/// Parse a comma-separated list of managed rule kinds, dropping duplicates.
///
/// # Errors
///
/// Returns [`LifecycleError::Config`] on an unknown kind.
pub fn parse_rule_kinds(value: &str) -> LifecycleResult<Vec<ManagedRuleKind>> {
    let mut kinds = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: ManagedRuleKind = part
            .parse()
            .map_err(|e| LifecycleError::Config(format!("MANAGED_RULES: {e}")))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> LifecycleResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LifecycleError::Config(format!("{name} must be an integer, got {value:?}")))
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use s3_lifecycle_model::{INTELLIGENT_TIERING_RULE_ID, MULTIPART_UPLOAD_RULE_ID};

    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = LifecycleConfig::default();
        assert_eq!(config.multipart_abort_days, 7);
        assert_eq!(config.tiering_days, 30);
        assert_eq!(config.managed_rules, ManagedRuleKind::ALL.to_vec());
        assert!(!config.continue_on_error);
        assert!(!config.dry_run);
        assert_eq!(config.conflict_retries, 2);
        assert!(config.verify_before_write);
        assert!(config.endpoint_url.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_match_builder_defaults() {
        assert_eq!(LifecycleConfig::builder().build(), LifecycleConfig::default());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = LifecycleConfig::builder()
            .multipart_abort_days(3)
            .tiering_days(45)
            .managed_rules(vec![ManagedRuleKind::IntelligentTiering])
            .dry_run(true)
            .endpoint_url(Some("http://localhost:4566".into()))
            .force_path_style(true)
            .build();

        assert_eq!(config.multipart_abort_days, 3);
        assert_eq!(config.tiering_days, 45);
        assert!(config.dry_run);
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert!(config.force_path_style);
    }

    #[test]
    fn test_should_produce_desired_rules_in_order() {
        let rules = LifecycleConfig::default().desired_rules().expect("valid");
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![MULTIPART_UPLOAD_RULE_ID, INTELLIGENT_TIERING_RULE_ID]);
    }

    #[test]
    fn test_should_reject_invalid_days() {
        let config = LifecycleConfig::builder().multipart_abort_days(0).build();
        assert!(matches!(
            config.validate(),
            Err(LifecycleError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_should_reject_empty_rule_selection() {
        let config = LifecycleConfig::builder().managed_rules(Vec::new()).build();
        assert!(matches!(config.validate(), Err(LifecycleError::Config(_))));
    }

    #[test]
    fn test_should_parse_rule_kinds() {
        assert_eq!(
            parse_rule_kinds("intelligent-tiering, multipart-abort,tiering").expect("valid"),
            vec![
                ManagedRuleKind::IntelligentTiering,
                ManagedRuleKind::MultipartAbort
            ]
        );
        assert!(parse_rule_kinds("expiration").is_err());
        assert!(parse_rule_kinds("").expect("valid").is_empty());
    }

    #[test]
    fn test_should_parse_numbers() {
        assert_eq!(parse_number::<i32>("X", " 14 ").expect("valid"), 14);
        assert!(parse_number::<i32>("X", "seven").is_err());
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&LifecycleConfig::default()).expect("test serialization");
        assert!(json.contains("multipartAbortDays"));
        assert!(json.contains("tieringDays"));
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
