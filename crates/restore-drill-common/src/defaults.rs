//! Default configuration values
//!
//! Shared so the CLI, the orchestrator and its tests agree on one set of numbers.

use std::time::Duration;

/// Default project name used in identifiers, tags and metric dimensions
pub const DEFAULT_PROJECT_NAME: &str = "unified-health";

/// Default environment name
pub const DEFAULT_ENVIRONMENT: &str = "prod";

/// Default region label (a deployment label, not an AWS region)
pub const DEFAULT_REGION_NAME: &str = "americas";

/// Default budget for the restored cluster to become available (minutes)
pub const DEFAULT_MAX_WAIT_MINUTES: u64 = 60;

/// Default budget for the test instance to become available (minutes)
pub const DEFAULT_INSTANCE_WAIT_MINUTES: u64 = 30;

/// Default interval between availability polls (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Instance class for the throwaway test instance
pub const DEFAULT_TEST_INSTANCE_CLASS: &str = "db.t3.medium";

/// Pause between initiating instance deletion and cluster deletion
pub const CLEANUP_SETTLE_DELAY: Duration = Duration::from_secs(30);

/// Cooldown before the single retry of a cluster deletion rejected for state
pub const CLEANUP_RETRY_COOLDOWN: Duration = Duration::from_secs(60);

/// Maximum snapshots requested per snapshot kind
pub const SNAPSHOT_PAGE_SIZE: i32 = 20;

/// Maximum length of an RDS cluster or instance identifier
pub const MAX_CLUSTER_IDENTIFIER_LEN: usize = 63;

/// Suffix appended to the test cluster identifier to name its single instance
pub const INSTANCE_SUFFIX: &str = "-inst-1";

/// Infix marking an identifier as a restore-test cluster
pub const RESTORE_TEST_INFIX: &str = "restore-test";

/// SNS subject length limit
pub const MAX_SUBJECT_LEN: usize = 100;
