//! Deployment invariants: sanitize post-conditions and bucket stability.

use geomsaek::{
    bucket_for, AbPolicy, DeploymentConfig, EnvConfig, Environment, SimilarityWeights,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn arbitrary_weights() -> impl Strategy<Value = SimilarityWeights> {
    (
        -10.0f64..10.0,
        -10.0f64..10.0,
        -10.0f64..10.0,
        -10.0f64..10.0,
        -2.0f64..2.0,
        -2.0f64..2.0,
    )
        .prop_map(|(e, j, k, m, p, x)| SimilarityWeights {
            edit_distance: e,
            jaccard: j,
            keyboard: k,
            jamo: m,
            prefix: p,
            exact: x,
        })
}

fn arbitrary_config() -> impl Strategy<Value = DeploymentConfig> {
    (
        -5i64..5,
        arbitrary_weights(),
        prop::option::of(arbitrary_weights()),
        any::<bool>(),
        -3.0f64..3.0,
        "[a-z]{0,6}",
    )
        .prop_map(|(schema, control, treatment, enabled, ratio, salt)| {
            let mut environments = BTreeMap::new();
            environments.insert(
                Environment::Production,
                EnvConfig {
                    control_weights: control,
                    treatment_weights: treatment,
                    ab_policy: AbPolicy {
                        enabled,
                        treatment_ratio: ratio,
                        salt,
                    },
                },
            );
            DeploymentConfig {
                schema_version: schema,
                environments,
                ..Default::default()
            }
        })
}

proptest! {
    #[test]
    fn sanitize_establishes_every_invariant(config in arbitrary_config()) {
        let clean = config.sanitize();

        prop_assert!(clean.schema_version > 0);
        prop_assert!(!clean.model_version.is_empty());
        prop_assert_eq!(clean.environments.len(), 3);

        for env in clean.environments.values() {
            let w = &env.control_weights;
            for core in [w.edit_distance, w.jaccard, w.keyboard, w.jamo] {
                prop_assert!((0.01..=2.0).contains(&core));
            }
            for bonus in [w.prefix, w.exact] {
                prop_assert!((0.0..=0.5).contains(&bonus));
            }
            let p = &env.ab_policy;
            prop_assert!((0.0..=1.0).contains(&p.treatment_ratio));
            prop_assert!(!p.salt.is_empty());
            if env.treatment_weights.is_none() {
                prop_assert!(!p.enabled);
                prop_assert_eq!(p.treatment_ratio, 0.0);
            }
            if !p.enabled {
                prop_assert_eq!(p.treatment_ratio, 0.0);
            }
        }
    }

    #[test]
    fn sanitize_is_idempotent(config in arbitrary_config()) {
        let once = config.sanitize();
        let twice = once.sanitize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn buckets_are_stable(salt in "[a-z]{1,8}", user in "[a-z0-9-]{1,12}", ratio in 0.0f64..1.0) {
        let first = bucket_for(&salt, &user, ratio);
        for _ in 0..10 {
            prop_assert_eq!(bucket_for(&salt, &user, ratio), first);
        }
    }

    #[test]
    fn ratio_extremes_are_total(salt in "[a-z]{1,8}", user in "[a-z0-9-]{1,12}") {
        prop_assert_eq!(bucket_for(&salt, &user, 0.0), geomsaek::Bucket::Control);
        prop_assert_eq!(bucket_for(&salt, &user, 1.0), geomsaek::Bucket::Treatment);
    }
}
