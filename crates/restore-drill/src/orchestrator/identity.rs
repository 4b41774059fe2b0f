//! Cluster Identity Generator

use crate::config::IdentityConfig;
use chrono::{DateTime, Utc};
use restore_drill_common::defaults::{
    INSTANCE_SUFFIX, MAX_CLUSTER_IDENTIFIER_LEN, RESTORE_TEST_INFIX,
};

/// Timestamp format embedded in cluster identifiers (second resolution)
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Rendered length of `TIMESTAMP_FORMAT`
const TIMESTAMP_LEN: usize = 14;

/// Identifier prefix shared by every test cluster of this deployment
pub fn identifier_prefix(identity: &IdentityConfig) -> String {
    bounded(unbounded_prefix(identity))
}

/// Length of the instance identifier a drill creates, before any truncation.
///
/// The instance id is the longest identifier a run produces. When it fits in
/// 63 characters the cluster id keeps its full timestamp and never collides
/// with one generated a second apart.
pub fn longest_identifier_len(identity: &IdentityConfig) -> usize {
    unbounded_prefix(identity).len() + 1 + TIMESTAMP_LEN + INSTANCE_SUFFIX.len()
}

fn unbounded_prefix(identity: &IdentityConfig) -> String {
    format!(
        "{}-{}-{}-{}",
        identity.project, identity.environment, identity.region_name, RESTORE_TEST_INFIX
    )
}

/// `{project}-{environment}-{region}-restore-test-{timestamp}`, at most 63 characters
pub fn cluster_identifier(identity: &IdentityConfig, now: DateTime<Utc>) -> String {
    bounded(format!(
        "{}-{}-{}-{}-{}",
        identity.project,
        identity.environment,
        identity.region_name,
        RESTORE_TEST_INFIX,
        now.format(TIMESTAMP_FORMAT)
    ))
}

/// Identifier of the single instance created inside a test cluster
///
/// Not re-bounded. Run configuration is rejected up front when this would
/// exceed 63 characters (see `longest_identifier_len`).
pub fn instance_identifier(cluster_id: &str) -> String {
    format!("{cluster_id}{INSTANCE_SUFFIX}")
}

// RDS identifiers may not end with a hyphen.
fn bounded(id: String) -> String {
    let truncated: String = id.chars().take(MAX_CLUSTER_IDENTIFIER_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn identity(project: &str, environment: &str, region_name: &str) -> IdentityConfig {
        IdentityConfig {
            project: project.into(),
            environment: environment.into(),
            region_name: region_name.into(),
        }
    }

    #[test]
    fn default_shape() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let id = cluster_identifier(&identity("unified-health", "prod", "americas"), now);
        assert_eq!(id, "unified-health-prod-americas-restore-test-20260102030405");
        assert_eq!(
            instance_identifier(&id),
            "unified-health-prod-americas-restore-test-20260102030405-inst-1"
        );
    }

    #[test]
    fn default_identity_fits_instance_limit() {
        let ident = identity("unified-health", "prod", "americas");
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let instance = instance_identifier(&cluster_identifier(&ident, now));
        assert_eq!(longest_identifier_len(&ident), instance.len());
        assert!(instance.len() <= MAX_CLUSTER_IDENTIFIER_LEN);
    }

    #[test]
    fn oversized_identity_is_measured_before_truncation() {
        let ident = identity(&"p".repeat(50), "prod", "americas");
        assert!(longest_identifier_len(&ident) > MAX_CLUSTER_IDENTIFIER_LEN);

        // Truncation would swallow the timestamp; this is what validation prevents.
        let first = cluster_identifier(&ident, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
        let second = cluster_identifier(&ident, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 6).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn long_names_are_truncated() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let ident = identity("a-very-long-project-name-for-testing", "production", "europe");
        let id = cluster_identifier(&ident, now);
        assert!(id.len() <= MAX_CLUSTER_IDENTIFIER_LEN);
        assert!(id.starts_with(&identifier_prefix(&ident)));
    }

    #[test]
    fn truncation_never_leaves_trailing_hyphen() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        // The separator before the timestamp lands exactly on character 63.
        let ident = identity(&"p".repeat(41), "prod", "eu");
        let id = cluster_identifier(&ident, now);
        assert_eq!(id.len(), MAX_CLUSTER_IDENTIFIER_LEN - 1);
        assert!(id.ends_with("restore-test"));
    }

    proptest! {
        #[test]
        fn identifier_is_bounded(
            project in "[a-z][a-z0-9-]{0,60}",
            environment in "[a-z]{1,20}",
            region in "[a-z]{1,20}",
            secs in 0i64..4_000_000_000,
        ) {
            let now = DateTime::from_timestamp(secs, 0).unwrap();
            let id = cluster_identifier(&identity(&project, &environment, &region), now);
            prop_assert!(id.len() <= MAX_CLUSTER_IDENTIFIER_LEN);
            prop_assert!(!id.ends_with('-'));
        }

        #[test]
        fn fitting_identities_are_distinct_one_second_apart(
            project in "[a-z][a-z0-9-]{0,19}",
            environment in "[a-z]{1,10}",
            region in "[a-z]{1,10}",
            secs in 0i64..4_000_000_000,
        ) {
            let ident = identity(&project, &environment, &region);
            prop_assume!(longest_identifier_len(&ident) <= MAX_CLUSTER_IDENTIFIER_LEN);

            let first = cluster_identifier(&ident, DateTime::from_timestamp(secs, 0).unwrap());
            let second = cluster_identifier(&ident, DateTime::from_timestamp(secs + 1, 0).unwrap());
            prop_assert_ne!(&first, &second);
            prop_assert!(instance_identifier(&first).len() <= MAX_CLUSTER_IDENTIFIER_LEN);
            prop_assert!(instance_identifier(&second).len() <= MAX_CLUSTER_IDENTIFIER_LEN);
        }
    }
}
