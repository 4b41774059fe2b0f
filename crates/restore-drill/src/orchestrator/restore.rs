//! Restore Driver
//!
//! Issues the two provisioning calls and waits for each resource in turn.
//! Provisioning calls are never retried; any rejection ends the drill.

use crate::aws::{CreateInstanceRequest, RdsOperations, RestoreClusterRequest, Snapshot};
use crate::config::DrillConfig;
use crate::error::{DrillError, ProvisioningStage};
use crate::wait::{WaitConfig, WaitOutcome, WaitState, WaitTarget, wait_for_available};
use restore_drill_common::tags::{cluster_tags, instance_tags};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Build the restore request for `cluster_id` from the chosen snapshot.
///
/// Engine and version come from the snapshot so the restore matches what was
/// backed up.
pub fn restore_request(
    config: &DrillConfig,
    snapshot: &Snapshot,
    cluster_id: &str,
) -> RestoreClusterRequest {
    RestoreClusterRequest {
        cluster_id: cluster_id.to_string(),
        snapshot_id: snapshot.id.clone(),
        engine: snapshot.engine.clone(),
        engine_version: snapshot.engine_version.clone(),
        subnet_group: config.target.subnet_group.clone(),
        security_group_ids: config.target.security_group_ids.clone(),
        tags: cluster_tags(
            cluster_id,
            &config.identity.project,
            &config.identity.environment,
        ),
    }
}

/// Build the request for the single test instance of a restored cluster.
pub fn instance_request(
    config: &DrillConfig,
    snapshot: &Snapshot,
    cluster_id: &str,
    instance_id: &str,
) -> CreateInstanceRequest {
    CreateInstanceRequest {
        instance_id: instance_id.to_string(),
        cluster_id: cluster_id.to_string(),
        instance_class: config.target.instance_class.clone(),
        engine: snapshot.engine.clone(),
        tags: instance_tags(instance_id),
    }
}

/// Start restoring the test cluster. Success means the restore was accepted.
pub async fn restore_cluster<R: RdsOperations>(
    rds: &R,
    request: RestoreClusterRequest,
) -> Result<(), DrillError> {
    let cluster_id = request.cluster_id.clone();
    info!(
        cluster_id = %cluster_id,
        snapshot_id = %request.snapshot_id,
        engine = %request.engine,
        "Restoring cluster from snapshot"
    );

    rds.restore_cluster_from_snapshot(request)
        .await
        .map_err(|source| {
            error!(
                cluster_id = %cluster_id,
                error = %source,
                retryable = source.is_retryable(),
                "Restore rejected"
            );
            if let Some(hint) = source.suggestion() {
                warn!("{hint}");
            }
            DrillError::ProvisioningFailure {
                stage: ProvisioningStage::RestoreCluster,
                resource_id: cluster_id,
                source,
            }
        })
}

/// Start creating the test instance inside the restored cluster.
pub async fn create_instance<R: RdsOperations>(
    rds: &R,
    request: CreateInstanceRequest,
) -> Result<(), DrillError> {
    let instance_id = request.instance_id.clone();
    info!(
        instance_id = %instance_id,
        instance_class = %request.instance_class,
        "Creating test instance"
    );

    rds.create_instance(request).await.map_err(|source| {
        error!(
            instance_id = %instance_id,
            error = %source,
            retryable = source.is_retryable(),
            "Instance creation rejected"
        );
        if let Some(hint) = source.suggestion() {
            warn!("{hint}");
        }
        DrillError::ProvisioningFailure {
            stage: ProvisioningStage::CreateInstance,
            resource_id: instance_id,
            source,
        }
    })
}

/// Wait for a test cluster or instance to become available.
pub async fn await_available<R: RdsOperations>(
    rds: &R,
    target: WaitTarget,
    resource_id: &str,
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
) -> Result<WaitOutcome, DrillError> {
    info!(
        target = %target,
        resource_id = %resource_id,
        timeout_secs = config.timeout.as_secs(),
        "Waiting for resource to become available"
    );

    let probe = move || async move {
        match target {
            WaitTarget::Cluster => rds.describe_cluster(resource_id).await.map(|c| c.status),
            WaitTarget::Instance => rds.describe_instance(resource_id).await.map(|i| i.status),
        }
    };
    let outcome = wait_for_available(config, cancel, target.policy(), resource_id, probe).await;

    let resource_id = resource_id.to_string();
    match outcome.state {
        WaitState::Available => {
            info!(
                target = %target,
                resource_id = %resource_id,
                elapsed_secs = outcome.elapsed.as_secs(),
                attempts = outcome.attempts,
                "Resource available"
            );
            Ok(outcome)
        }
        WaitState::TerminalFailure(status) => Err(DrillError::TerminalFailure {
            target,
            resource_id,
            status,
        }),
        WaitState::Cancelled => Err(DrillError::Cancelled {
            target,
            resource_id,
        }),
        WaitState::TimedOut | WaitState::Pending | WaitState::InProgress(_) => {
            Err(DrillError::TimedOut {
                target,
                resource_id,
                waited_secs: outcome.elapsed.as_secs(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::rds::MockRdsOperations;
    use crate::aws::{ClusterDescription, RdsError};
    use restore_drill_common::SnapshotKind;
    use restore_drill_common::tags::{TAG_AUTO_DELETE, TAG_PURPOSE};
    use std::time::Duration;

    fn snapshot() -> Snapshot {
        Snapshot {
            id: "rds:prod-db-2026-05-04".into(),
            cluster_id: "prod-db".into(),
            created_at: None,
            status: "available".into(),
            kind: Some(SnapshotKind::Automated),
            engine: "aurora-mysql".into(),
            engine_version: Some("8.0.mysql_aurora.3.05.2".into()),
        }
    }

    fn config() -> DrillConfig {
        let mut config = DrillConfig::default();
        config.target.subnet_group = "db-subnets".into();
        config.target.security_group_ids = vec!["sg-1".into(), "sg-2".into()];
        config
    }

    #[test]
    fn restore_request_inherits_snapshot_engine() {
        let request = restore_request(&config(), &snapshot(), "test-cluster");
        assert_eq!(request.engine, "aurora-mysql");
        assert_eq!(request.engine_version.as_deref(), Some("8.0.mysql_aurora.3.05.2"));
        assert_eq!(request.subnet_group, "db-subnets");
        assert_eq!(request.security_group_ids, vec!["sg-1", "sg-2"]);
        assert!(request.tags.contains(&(TAG_PURPOSE.into(), "BackupRestoreTest".into())));
        assert!(request.tags.contains(&(TAG_AUTO_DELETE.into(), "true".into())));
    }

    #[test]
    fn instance_request_uses_configured_class() {
        let request = instance_request(&config(), &snapshot(), "c", "c-instance-1");
        assert_eq!(request.instance_class, "db.t3.medium");
        assert_eq!(request.cluster_id, "c");
        assert_eq!(request.engine, "aurora-mysql");
    }

    #[tokio::test]
    async fn rejected_restore_is_provisioning_failure() {
        let mut rds = MockRdsOperations::new();
        rds.expect_restore_cluster_from_snapshot()
            .times(1)
            .returning(|_| Err(RdsError::AlreadyExists("DBClusterAlreadyExistsFault".into())));

        let err = restore_cluster(&rds, restore_request(&config(), &snapshot(), "c"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DrillError::ProvisioningFailure {
                stage: ProvisioningStage::RestoreCluster,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cluster_failure_status_maps_to_terminal_failure() {
        let mut rds = MockRdsOperations::new();
        rds.expect_describe_cluster().times(1).returning(|id| {
            Ok(ClusterDescription {
                id: id.to_string(),
                status: "incompatible-parameters".into(),
                ..Default::default()
            })
        });

        let wait = WaitConfig {
            poll_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(600),
        };
        let err = await_available(&rds, WaitTarget::Cluster, "c", &wait, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DrillError::TerminalFailure { target: WaitTarget::Cluster, ref status, .. }
                if status == "incompatible-parameters"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn instance_wait_times_out() {
        let mut rds = MockRdsOperations::new();
        rds.expect_describe_instance()
            .returning(|_| Err(RdsError::missing("DBInstanceNotFound", "c-instance-1")));

        let wait = WaitConfig {
            poll_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(90),
        };
        let err = await_available(&rds, WaitTarget::Instance, "c-instance-1", &wait, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DrillError::TimedOut { target: WaitTarget::Instance, waited_secs: 90, .. }
        ));
    }
}
