//! Lifecycle reconciliation integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_s3::types::{
        BucketLifecycleConfiguration, ExpirationStatus, LifecycleExpiration, LifecycleRule,
        LifecycleRuleFilter,
    };
    use s3_lifecycle_core::{LifecycleBackend, LifecycleConfig, Orchestrator, Reconciler};
    use s3_lifecycle_model::{
        DesiredRuleSpec, INTELLIGENT_TIERING_RULE_ID, MULTIPART_UPLOAD_RULE_ID, Outcome,
    };

    use crate::{cleanup_bucket, create_test_bucket, lifecycle_backend, s3_client};

    fn reconciler() -> Reconciler {
        Reconciler::new(Arc::new(lifecycle_backend())).with_conflict_retries(2)
    }

    async fn put_unmanaged_rule(client: &aws_sdk_s3::Client, bucket: &str) {
        let rule = LifecycleRule::builder()
            .id("expire-tmp")
            .status(ExpirationStatus::Enabled)
            .filter(LifecycleRuleFilter::builder().prefix("tmp/").build())
            .expiration(LifecycleExpiration::builder().days(1).build())
            .build()
            .expect("valid rule");
        let configuration = BucketLifecycleConfiguration::builder()
            .rules(rule)
            .build()
            .expect("valid configuration");
        client
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(configuration)
            .send()
            .await
            .expect("put_bucket_lifecycle_configuration");
    }

    async fn rule_ids(client: &aws_sdk_s3::Client, bucket: &str) -> Vec<String> {
        let resp = client
            .get_bucket_lifecycle_configuration()
            .bucket(bucket)
            .send()
            .await
            .expect("get_bucket_lifecycle_configuration");
        resp.rules()
            .iter()
            .filter_map(|r| r.id().map(ToOwned::to_owned))
            .collect()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_read_unconfigured_bucket_as_empty() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lc-empty").await;

        let snapshot = lifecycle_backend()
            .read_lifecycle(&bucket)
            .await
            .expect("read_lifecycle");

        assert!(!snapshot.configured);
        assert!(snapshot.rules.is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_managed_rules_once() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lc-create").await;
        let reconciler = reconciler();
        let multipart = DesiredRuleSpec::multipart_abort(7).expect("valid spec");
        let tiering = DesiredRuleSpec::intelligent_tiering(30).expect("valid spec");

        let first = reconciler.reconcile(&bucket, &multipart).await.expect("reconcile");
        assert_eq!(first.outcome, Outcome::Created);
        let first = reconciler.reconcile(&bucket, &tiering).await.expect("reconcile");
        assert_eq!(first.outcome, Outcome::Created);

        let again = reconciler.reconcile(&bucket, &multipart).await.expect("reconcile");
        assert_eq!(again.outcome, Outcome::Unchanged);
        assert!(!again.written);
        let again = reconciler.reconcile(&bucket, &tiering).await.expect("reconcile");
        assert_eq!(again.outcome, Outcome::Unchanged);

        assert_eq!(
            rule_ids(&client, &bucket).await,
            vec![MULTIPART_UPLOAD_RULE_ID, INTELLIGENT_TIERING_RULE_ID]
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_keep_unmanaged_rules() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lc-keep").await;
        put_unmanaged_rule(&client, &bucket).await;

        let report = reconciler()
            .reconcile(&bucket, &DesiredRuleSpec::multipart_abort(7).expect("valid spec"))
            .await
            .expect("reconcile");

        assert_eq!(report.outcome, Outcome::Created);
        assert_eq!(
            rule_ids(&client, &bucket).await,
            vec!["expire-tmp", MULTIPART_UPLOAD_RULE_ID]
        );

        let snapshot = lifecycle_backend()
            .read_lifecycle(&bucket)
            .await
            .expect("read_lifecycle");
        let unmanaged = &snapshot.rules[0];
        assert_eq!(unmanaged.expiration.as_ref().and_then(|e| e.days), Some(1));
        assert_eq!(
            unmanaged.filter.as_ref().and_then(|f| f.prefix.as_deref()),
            Some("tmp/")
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_update_tiering_days_in_place() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lc-update").await;
        put_unmanaged_rule(&client, &bucket).await;
        let reconciler = reconciler();

        reconciler
            .reconcile(&bucket, &DesiredRuleSpec::intelligent_tiering(30).expect("valid spec"))
            .await
            .expect("reconcile");
        let report = reconciler
            .reconcile(&bucket, &DesiredRuleSpec::intelligent_tiering(45).expect("valid spec"))
            .await
            .expect("reconcile");

        assert_eq!(report.outcome, Outcome::Updated);
        let snapshot = lifecycle_backend()
            .read_lifecycle(&bucket)
            .await
            .expect("read_lifecycle");
        assert_eq!(snapshot.rules.len(), 2);
        assert!(snapshot.rules[1].has_id(INTELLIGENT_TIERING_RULE_ID));
        assert_eq!(snapshot.rules[1].transitions[0].days, Some(45));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_dry_run_every_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lc-dry").await;
        let config = LifecycleConfig::builder().dry_run(true).build();

        let orchestrator =
            Orchestrator::from_config(Arc::new(lifecycle_backend()), &config).expect("config");
        let summary = orchestrator.run().await.expect("run");

        assert!(summary.buckets_processed >= 1);
        let ours: Vec<_> = summary
            .reports
            .iter()
            .filter(|r| r.bucket == bucket)
            .collect();
        assert_eq!(ours.len(), 2);
        assert!(ours.iter().all(|r| r.outcome == Outcome::Created && !r.written));

        let snapshot = lifecycle_backend()
            .read_lifecycle(&bucket)
            .await
            .expect("read_lifecycle");
        assert!(!snapshot.configured);

        cleanup_bucket(&client, &bucket).await;
    }
}
