//! Cleanup Guarantor
//!
//! Deletes the test instance(s), pauses for the control plane to register it,
//! then deletes the cluster. Already-absent resources count as deleted. A
//! cluster deletion rejected for state is retried exactly once after a
//! cooldown. Nothing here returns an error: the outcome is a report.

use crate::aws::{RdsError, RdsOperations};
use backon::{ConstantBuilder, Retryable};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fixed delays used while tearing down
#[derive(Debug, Clone, Copy)]
pub struct CleanupPolicy {
    /// Pause between instance deletion and cluster deletion
    pub settle_delay: Duration,
    /// Wait before retrying a cluster deletion rejected for state
    pub retry_cooldown: Duration,
}

/// Result of one deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

impl StepResult {
    pub fn is_ok(&self) -> bool {
        !matches!(self, StepResult::Failed(_))
    }

    fn from_delete(result: Result<(), RdsError>) -> Self {
        match result {
            Ok(()) => StepResult::Deleted,
            Err(e) if e.is_not_found() => StepResult::AlreadyAbsent,
            Err(e) => StepResult::Failed(e.to_string()),
        }
    }
}

/// What cleanup did for one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub cluster_id: String,
    pub instances: Vec<(String, StepResult)>,
    pub cluster: StepResult,
}

impl CleanupOutcome {
    /// True only if every instance and the cluster are gone or going
    pub fn completed(&self) -> bool {
        self.cluster.is_ok() && self.instances.iter().all(|(_, step)| step.is_ok())
    }
}

/// Tear down a test cluster and its instances.
///
/// Cancellation shortens the pauses but never skips a deletion.
pub async fn cleanup_test_resources<R: RdsOperations>(
    rds: &R,
    cluster_id: &str,
    instance_ids: &[String],
    policy: CleanupPolicy,
    cancel: Option<&CancellationToken>,
) -> CleanupOutcome {
    info!(cluster_id = %cluster_id, instances = ?instance_ids, "Cleaning up test resources");

    let mut instances = Vec::with_capacity(instance_ids.len());
    for instance_id in instance_ids {
        let step = StepResult::from_delete(rds.delete_instance(instance_id).await);
        match &step {
            StepResult::Deleted => info!(instance_id = %instance_id, "Instance deletion initiated"),
            StepResult::AlreadyAbsent => {
                info!(instance_id = %instance_id, "Instance not found, may already be deleted")
            }
            StepResult::Failed(e) => {
                warn!(instance_id = %instance_id, error = %e, "Failed to delete instance")
            }
        }
        instances.push((instance_id.clone(), step));
    }

    if !instance_ids.is_empty() {
        debug!(delay = ?policy.settle_delay, "Waiting for instance deletion to register");
        interruptible_sleep(policy.settle_delay, cancel.cloned()).await;
    }

    let cooldown_cancel = cancel.cloned();
    let result = (|| async { rds.delete_cluster(cluster_id).await })
        .retry(
            ConstantBuilder::default()
                .with_delay(policy.retry_cooldown)
                .with_max_times(1),
        )
        .sleep(move |delay| interruptible_sleep(delay, cooldown_cancel.clone()))
        .when(RdsError::is_invalid_state)
        .notify(|e, dur| {
            warn!(
                cluster_id = %cluster_id,
                delay = ?dur,
                error = %e,
                "Cluster not deletable yet, retrying once..."
            );
        })
        .await;

    let cluster = StepResult::from_delete(result);
    match &cluster {
        StepResult::Deleted => info!(cluster_id = %cluster_id, "Cluster deletion initiated"),
        StepResult::AlreadyAbsent => {
            info!(cluster_id = %cluster_id, "Cluster not found, may already be deleted")
        }
        StepResult::Failed(e) => {
            error!(cluster_id = %cluster_id, error = %e, "Failed to delete cluster")
        }
    }

    CleanupOutcome {
        cluster_id: cluster_id.to_string(),
        instances,
        cluster,
    }
}

async fn interruptible_sleep(delay: Duration, cancel: Option<CancellationToken>) {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => {}
            }
        }
        None => tokio::time::sleep(delay).await,
    }
}
