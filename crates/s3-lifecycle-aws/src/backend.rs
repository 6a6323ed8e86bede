//! [`LifecycleBackend`] over `aws-sdk-s3`.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{BucketLifecycleConfiguration, TransitionDefaultMinimumObjectSize};
use dashmap::DashMap;
use s3_lifecycle_core::{
    BackendError, LifecycleBackend, LifecycleConfig, LifecycleSnapshot, VersionToken,
    WriteOutcome,
};
use s3_lifecycle_model::LifecycleRule;
use tracing::debug;

use crate::convert::{rule_from_sdk, rule_to_sdk};

const NO_SUCH_LIFECYCLE_CONFIGURATION: &str = "NoSuchLifecycleConfiguration";

/// Lifecycle backend talking to S3 (or an S3-compatible endpoint).
///
/// S3 has no conditional lifecycle write. With `verify_before_write` the
/// backend re-reads the configuration right before `Put` and reports a
/// conflict when its version moved; a change landing between that re-read and
/// the `Put` is still overwritten.
///
/// `Put` replaces the bucket's transition default minimum object size along
/// with the rules, so the value seen by the latest read of each bucket is sent
/// back on write.
#[derive(Debug, Clone)]
pub struct AwsLifecycleBackend {
    client: Client,
    verify_before_write: bool,
    /// Bucket name to the transition default minimum object size last read.
    minimum_object_sizes: Arc<DashMap<String, TransitionDefaultMinimumObjectSize>>,
}

impl AwsLifecycleBackend {
    /// Wrap an existing client. Pre-write verification is on.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            verify_before_write: true,
            minimum_object_sizes: Arc::new(DashMap::new()),
        }
    }

    /// Enable or disable the pre-write re-read.
    #[must_use]
    pub fn with_verify_before_write(mut self, verify: bool) -> Self {
        self.verify_before_write = verify;
        self
    }

    /// Build a client from the ambient AWS configuration (credentials chain,
    /// region), applying the endpoint overrides in `config`.
    pub async fn from_config(config: &LifecycleConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
        if let Some(url) = &config.endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Self::new(Client::from_conf(builder.build()))
            .with_verify_before_write(config.verify_before_write)
    }

    fn remember_minimum_object_size(
        &self,
        bucket: &str,
        size: Option<&TransitionDefaultMinimumObjectSize>,
    ) {
        match size {
            Some(size) => {
                self.minimum_object_sizes
                    .insert(bucket.to_owned(), size.clone());
            }
            None => {
                self.minimum_object_sizes.remove(bucket);
            }
        }
    }

    async fn put_rules(&self, bucket: &str, rules: &[LifecycleRule]) -> Result<(), BackendError> {
        if rules.is_empty() {
            self.client
                .delete_bucket_lifecycle()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| sdk_failure("DeleteBucketLifecycle", bucket, &e))?;
            self.minimum_object_sizes.remove(bucket);
            return Ok(());
        }

        let sdk_rules = rules
            .iter()
            .map(rule_to_sdk)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(bucket, &e))?;
        let configuration = BucketLifecycleConfiguration::builder()
            .set_rules(Some(sdk_rules))
            .build()
            .map_err(|e| invalid(bucket, &e))?;
        let minimum_object_size = self
            .minimum_object_sizes
            .get(bucket)
            .map(|entry| entry.value().clone());

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(configuration)
            .set_transition_default_minimum_object_size(minimum_object_size)
            .send()
            .await
            .map_err(|e| sdk_failure("PutBucketLifecycleConfiguration", bucket, &e))?;
        Ok(())
    }
}

#[async_trait]
impl LifecycleBackend for AwsLifecycleBackend {
    async fn list_buckets(&self) -> Result<Vec<String>, BackendError> {
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_buckets()
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| BackendError::list_buckets(DisplayErrorContext(&e).to_string()))?;

            names.extend(
                output
                    .buckets()
                    .iter()
                    .filter_map(|bucket| bucket.name().map(ToOwned::to_owned)),
            );

            match output.continuation_token() {
                Some(token) if !token.is_empty() => continuation_token = Some(token.to_owned()),
                _ => break,
            }
        }

        debug!(count = names.len(), "listed buckets");
        Ok(names)
    }

    async fn read_lifecycle(&self, bucket: &str) -> Result<LifecycleSnapshot, BackendError> {
        let output = match self
            .client
            .get_bucket_lifecycle_configuration()
            .bucket(bucket)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if is_not_configured(&err) => {
                debug!(bucket, "bucket has no lifecycle configuration");
                self.remember_minimum_object_size(bucket, None);
                return Ok(LifecycleSnapshot::not_configured());
            }
            Err(err) => return Err(sdk_failure("GetBucketLifecycleConfiguration", bucket, &err)),
        };

        let rules = output
            .rules()
            .iter()
            .map(rule_from_sdk)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(bucket, &e))?;
        self.remember_minimum_object_size(bucket, output.transition_default_minimum_object_size());
        debug!(bucket, rules = rules.len(), "read lifecycle configuration");
        Ok(LifecycleSnapshot::configured(rules))
    }

    async fn write_lifecycle(
        &self,
        bucket: &str,
        rules: &[LifecycleRule],
        expected: &VersionToken,
    ) -> Result<WriteOutcome, BackendError> {
        if self.verify_before_write {
            let current = self.read_lifecycle(bucket).await?.version;
            if &current != expected {
                debug!(bucket, %expected, %current, "lifecycle configuration moved before write");
                return Ok(WriteOutcome::Conflict { current });
            }
        }

        self.put_rules(bucket, rules).await?;
        debug!(bucket, rules = rules.len(), "wrote lifecycle configuration");
        Ok(WriteOutcome::Applied)
    }
}

fn is_not_configured<E: ProvideErrorMetadata, R>(err: &SdkError<E, R>) -> bool {
    err.as_service_error()
        .and_then(ProvideErrorMetadata::code)
        .is_some_and(|code| code == NO_SUCH_LIFECYCLE_CONFIGURATION)
}

fn sdk_failure<E, R>(operation: &'static str, bucket: &str, err: &SdkError<E, R>) -> BackendError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    BackendError::bucket(operation, bucket, DisplayErrorContext(err).to_string())
}

fn invalid(bucket: &str, err: &dyn std::fmt::Display) -> BackendError {
    BackendError::InvalidConfiguration {
        bucket: bucket.to_owned(),
        message: err.to_string(),
    }
}
