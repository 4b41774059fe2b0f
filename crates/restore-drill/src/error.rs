//! Drill and configuration errors
//!
//! `DrillError` is the fatal taxonomy: the first one raised ends the pipeline
//! and becomes the run's error message. Cleanup and reporting problems are not
//! in here because they never end a run.

use crate::aws::RdsError;
use crate::wait::WaitTarget;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} may only contain ASCII letters, digits and hyphens, got: {value}")]
    InvalidIdentifierPart { field: &'static str, value: String },

    #[error("{field} must be greater than 0")]
    ZeroDuration { field: &'static str },

    #[error(
        "PROJECT_NAME, ENVIRONMENT and REGION_NAME produce {length}-character test identifiers, \
         RDS allows at most {max}"
    )]
    IdentifierTooLong { length: usize, max: usize },

    #[error("{field} is too large: {minutes} minutes")]
    DurationOverflow { field: &'static str, minutes: u64 },

    #[error("TEST_QUERIES must be a JSON array of strings: {0}")]
    InvalidQueries(#[from] serde_json::Error),

    #[error("Invalid trigger event '{path}': {source}")]
    InvalidEvent {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read trigger event '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Provisioning call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ProvisioningStage {
    #[strum(serialize = "initiate cluster restoration")]
    RestoreCluster,
    #[strum(serialize = "create test instance")]
    CreateInstance,
}

/// Fatal errors that abort a drill
#[derive(Debug, Error)]
pub enum DrillError {
    #[error("No RDS cluster identifier provided")]
    MissingClusterIdentifier,

    #[error("Failed to list snapshots for cluster {cluster_id}: {source}")]
    SnapshotLookup {
        cluster_id: String,
        #[source]
        source: RdsError,
    },

    #[error("No available snapshots found for cluster {cluster_id}")]
    NoSnapshotFound { cluster_id: String },

    #[error("Failed to {stage} {resource_id}: {source}")]
    ProvisioningFailure {
        stage: ProvisioningStage,
        resource_id: String,
        #[source]
        source: RdsError,
    },

    #[error("Test {target} {resource_id} failed with status '{status}'")]
    TerminalFailure {
        target: WaitTarget,
        resource_id: String,
        status: String,
    },

    #[error("Test {target} {resource_id} did not become available within {waited_secs}s")]
    TimedOut {
        target: WaitTarget,
        resource_id: String,
        waited_secs: u64,
    },

    #[error("Wait for test {target} {resource_id} was cancelled")]
    Cancelled {
        target: WaitTarget,
        resource_id: String,
    },

    #[error("Database connectivity test failed for {cluster_id}: {reason}")]
    ConnectivityFailure { cluster_id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DrillError::MissingClusterIdentifier.to_string(),
            "No RDS cluster identifier provided"
        );
        assert_eq!(
            DrillError::TerminalFailure {
                target: WaitTarget::Cluster,
                resource_id: "c-1".into(),
                status: "failed".into(),
            }
            .to_string(),
            "Test cluster c-1 failed with status 'failed'"
        );
        assert_eq!(
            ConfigError::Empty { field: "PROJECT_NAME" }.to_string(),
            "PROJECT_NAME cannot be empty"
        );
    }

    #[test]
    fn provisioning_failure_names_stage() {
        let err = DrillError::ProvisioningFailure {
            stage: ProvisioningStage::CreateInstance,
            resource_id: "c-1-instance-1".into(),
            source: RdsError::Throttled("slow down".into()),
        };
        assert!(err.to_string().starts_with("Failed to create test instance c-1-instance-1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::io("/tmp/event.json", io_err);
        assert!(err.to_string().contains("/tmp/event.json"));
    }
}
