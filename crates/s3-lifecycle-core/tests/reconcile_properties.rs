//! Property tests for the rule reconciliation function.

use proptest::prelude::*;
use s3_lifecycle_core::reconcile_rules;
use s3_lifecycle_model::{
    DesiredRuleSpec, ExpirationStatus, LifecycleExpiration, LifecycleRule, LifecycleRuleFilter,
    Outcome, Transition, TransitionStorageClass,
};

fn storage_class() -> impl Strategy<Value = TransitionStorageClass> {
    prop_oneof![
        Just(TransitionStorageClass::StandardIa),
        Just(TransitionStorageClass::Glacier),
        Just(TransitionStorageClass::DeepArchive),
        Just(TransitionStorageClass::IntelligentTiering),
    ]
}

/// Rules owned by other tooling. Lower-case ids never collide with the
/// managed ids.
fn unmanaged_rule() -> impl Strategy<Value = LifecycleRule> {
    (
        "[a-z][a-z0-9-]{0,11}",
        any::<bool>(),
        proptest::option::of("[a-z]{0,6}/"),
        proptest::option::of(1i32..3650),
        proptest::collection::vec((0i32..3650, storage_class()), 0..3),
    )
        .prop_map(|(id, enabled, prefix, expiration_days, transitions)| LifecycleRule {
            id: Some(id),
            status: if enabled {
                ExpirationStatus::Enabled
            } else {
                ExpirationStatus::Disabled
            },
            filter: Some(LifecycleRuleFilter {
                prefix,
                ..LifecycleRuleFilter::default()
            }),
            expiration: expiration_days.map(|days| LifecycleExpiration {
                days: Some(days),
                ..LifecycleExpiration::default()
            }),
            transitions: transitions
                .into_iter()
                .map(|(days, class)| Transition {
                    date: None,
                    days: Some(days),
                    storage_class: Some(class),
                })
                .collect(),
            ..LifecycleRule::default()
        })
}

fn desired_rule() -> impl Strategy<Value = DesiredRuleSpec> {
    prop_oneof![
        (1i32..365).prop_map(|d| DesiredRuleSpec::multipart_abort(d).expect("valid spec")),
        (0i32..365).prop_map(|d| DesiredRuleSpec::intelligent_tiering(d).expect("valid spec")),
    ]
}

fn without_id(rules: &[LifecycleRule], id: &str) -> Vec<LifecycleRule> {
    rules.iter().filter(|r| !r.has_id(id)).cloned().collect()
}

proptest! {
    /// Rules with other ids keep their content and relative order.
    #[test]
    fn prop_non_interference(
        others in proptest::collection::vec(unmanaged_rule(), 0..8),
        desired in desired_rule(),
    ) {
        let mut rules = others.clone();
        reconcile_rules(&mut rules, &desired);

        prop_assert_eq!(without_id(&rules, &desired.id), others);
    }

    /// A second reconciliation is a no-op.
    #[test]
    fn prop_idempotence(
        others in proptest::collection::vec(unmanaged_rule(), 0..8),
        desired in desired_rule(),
    ) {
        let mut rules = others;
        let first = reconcile_rules(&mut rules, &desired);
        let after_first = rules.clone();
        let second = reconcile_rules(&mut rules, &desired);

        prop_assert_eq!(first, Outcome::Created);
        prop_assert_eq!(second, Outcome::Unchanged);
        prop_assert_eq!(rules, after_first);
    }

    /// An existing managed rule is updated where it stands.
    #[test]
    fn prop_update_in_place(
        before in proptest::collection::vec(unmanaged_rule(), 0..4),
        after in proptest::collection::vec(unmanaged_rule(), 0..4),
        old_days in 0i32..365,
        new_days in 0i32..365,
    ) {
        prop_assume!(old_days != new_days);
        let existing = DesiredRuleSpec::intelligent_tiering(old_days).expect("valid spec");
        let desired = DesiredRuleSpec::intelligent_tiering(new_days).expect("valid spec");

        let mut rules = before.clone();
        rules.push(existing.to_rule());
        rules.extend(after.iter().cloned());
        let original = rules.clone();

        let outcome = reconcile_rules(&mut rules, &desired);

        prop_assert_eq!(outcome, Outcome::Updated);
        prop_assert_eq!(rules.len(), original.len());
        let position = before.len();
        prop_assert!(rules[position].has_id(&desired.id));
        prop_assert_eq!(rules[position].transitions[0].days, Some(new_days));
        prop_assert_eq!(&rules[position].status, &original[position].status);
        prop_assert_eq!(&rules[position].filter, &original[position].filter);
        prop_assert_eq!(without_id(&rules, &desired.id), without_id(&original, &desired.id));
    }

    /// Afterwards exactly one rule carries the id and it holds the desired
    /// parameters.
    #[test]
    fn prop_single_satisfied_rule(
        others in proptest::collection::vec(unmanaged_rule(), 0..8),
        desired in desired_rule(),
        preexisting in proptest::option::of(desired_rule()),
        insert_at in 0usize..8,
    ) {
        let mut rules = others;
        if let Some(existing) = preexisting {
            // Same id as the desired rule, parameters possibly different.
            let mut stale = existing.to_rule();
            stale.id = Some(desired.id.clone());
            let at = insert_at.min(rules.len());
            rules.insert(at, stale);
        }

        reconcile_rules(&mut rules, &desired);

        let matching: Vec<&LifecycleRule> = rules.iter().filter(|r| r.has_id(&desired.id)).collect();
        prop_assert_eq!(matching.len(), 1);
        prop_assert!(desired.is_satisfied_by(matching[0]));
    }
}
