//! Control-plane status sentinels
//!
//! RDS reports lifecycle status as free-form strings. The waiter only needs
//! to know which one means "done" and which ones mean "will never get there".

/// Status string reported once a cluster, instance or snapshot is usable
pub const AVAILABLE: &str = "available";

/// Terminal failure statuses for a restored cluster
pub const CLUSTER_FAILURE_STATUSES: &[&str] =
    &["failed", "incompatible-restore", "incompatible-parameters"];

/// Terminal failure statuses for a database instance
pub const INSTANCE_FAILURE_STATUSES: &[&str] = &["failed", "incompatible-restore"];

/// How to interpret raw status strings for one kind of resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Status meaning terminal success
    pub success: &'static str,
    /// Statuses meaning terminal failure
    pub failures: &'static [&'static str],
}

impl StatusPolicy {
    /// Policy for restored clusters
    pub const CLUSTER: Self = Self {
        success: AVAILABLE,
        failures: CLUSTER_FAILURE_STATUSES,
    };

    /// Policy for database instances
    pub const INSTANCE: Self = Self {
        success: AVAILABLE,
        failures: INSTANCE_FAILURE_STATUSES,
    };

    pub fn is_success(&self, status: &str) -> bool {
        status == self.success
    }

    pub fn is_failure(&self, status: &str) -> bool {
        self.failures.contains(&status)
    }
}

/// Snapshot kind as understood by `DescribeDBClusterSnapshots`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SnapshotKind {
    /// Scheduled by the backup window
    Automated,
    /// Triggered by an operator
    Manual,
}
