//! Restore drill orchestration
//!
//! [`RestoreDrill::run`] sequences locate → restore → wait (cluster, then
//! instance) → verify. Whatever happens in that pipeline, a test cluster that
//! was attempted is handed to cleanup, and the result is reported, before the
//! run returns.

pub mod cleanup;
pub mod identity;
pub mod lease;
pub mod locator;
pub mod report;
pub mod restore;
pub mod results;
pub mod sweep;
pub mod types;
pub mod verify;

pub use cleanup::{CleanupOutcome, CleanupPolicy, StepResult, cleanup_test_resources};
pub use lease::ClusterLease;
pub use report::{AwsReportingSink, MetricBatch, Notification, ReportingSink};
pub use sweep::{SweepConfig, SweepReport, sweep_orphans};
pub use types::{TestType, TriggerEvent, TriggerSource, resolve_cluster_identifier};

use crate::aws::RdsOperations;
use crate::config::DrillConfig;
use crate::error::DrillError;
use crate::wait::{WaitConfig, WaitTarget};
use chrono::Utc;
use restore_drill_common::TestRunResult;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// One restore drill against one source cluster
pub struct RestoreDrill<'a, R, S> {
    rds: &'a R,
    sink: &'a S,
    config: &'a DrillConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, R: RdsOperations, S: ReportingSink> RestoreDrill<'a, R, S> {
    pub fn new(rds: &'a R, sink: &'a S, config: &'a DrillConfig) -> Self {
        Self {
            rds,
            sink,
            config,
            cancel: None,
        }
    }

    /// Stop waits early when `token` is cancelled. Cleanup and reporting still run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the drill against `source_cluster` and return its result.
    ///
    /// Never fails: fatal errors end up in `error_message`.
    pub async fn run(&self, source_cluster: Option<&str>) -> TestRunResult {
        let mut result = TestRunResult::default();
        let mut lease = None;

        match self.execute(source_cluster, &mut result, &mut lease).await {
            Ok(()) => {
                result.success = true;
                info!(
                    test_cluster_id = ?result.test_cluster_id,
                    restore_minutes = result.restore_duration_minutes,
                    "Backup restoration test completed successfully"
                );
            }
            Err(e) => {
                result.success = false;
                result.error_message = Some(e.to_string());
                error!(error = %e, "Backup restoration test failed");
            }
        }

        if let Some(lease) = lease {
            result.cleanup_completed = self.settle_lease(lease).await;
        }

        report::report_run(
            self.sink,
            &self.config.identity,
            &self.config.reporting,
            &result,
        )
        .await;

        result
    }

    async fn execute(
        &self,
        source_cluster: Option<&str>,
        result: &mut TestRunResult,
        lease: &mut Option<ClusterLease>,
    ) -> Result<(), DrillError> {
        let config = self.config;
        let cancel = self.cancel.as_ref();
        let source_cluster = source_cluster.ok_or(DrillError::MissingClusterIdentifier)?;

        info!(cluster_id = %source_cluster, "Finding latest snapshot");
        let snapshot = locator::locate_latest_snapshot(self.rds, source_cluster).await?;
        result.snapshot_id = Some(snapshot.id.clone());
        result.snapshot_create_time = snapshot.created_at;

        let now = Utc::now();
        let cluster_id = identity::cluster_identifier(&config.identity, now);
        let instance_id = identity::instance_identifier(&cluster_id);
        result.test_cluster_id = Some(cluster_id.clone());
        result.restore_start_time = Some(now);
        *lease = Some(ClusterLease::acquire(&cluster_id, &instance_id));

        restore::restore_cluster(
            self.rds,
            restore::restore_request(config, &snapshot, &cluster_id),
        )
        .await?;

        let cluster_wait = WaitConfig {
            poll_interval: config.timing.poll_interval,
            timeout: config.timing.cluster_wait,
        };
        restore::await_available(
            self.rds,
            WaitTarget::Cluster,
            &cluster_id,
            &cluster_wait,
            cancel,
        )
        .await?;

        restore::create_instance(
            self.rds,
            restore::instance_request(config, &snapshot, &cluster_id, &instance_id),
        )
        .await?;

        let instance_wait = WaitConfig {
            poll_interval: config.timing.poll_interval,
            timeout: config.timing.instance_wait,
        };
        restore::await_available(
            self.rds,
            WaitTarget::Instance,
            &instance_id,
            &instance_wait,
            cancel,
        )
        .await?;

        result.finish_restore(Utc::now());
        info!(
            cluster_id = %cluster_id,
            restore_minutes = result.restore_duration_minutes,
            "Restore complete"
        );

        verify::check_connectivity(self.rds, &cluster_id).await?;
        result.connectivity_test_passed = true;

        result.data_integrity_tests = verify::run_integrity_checks(
            self.rds,
            &cluster_id,
            &config.verification.test_queries,
        )
        .await;
        if !result.integrity_passed() {
            warn!(cluster_id = %cluster_id, "Some data integrity tests failed");
        }

        Ok(())
    }

    /// Clean up (or knowingly leave) the leased cluster. Returns `cleanup_completed`.
    async fn settle_lease(&self, lease: ClusterLease) -> bool {
        if !self.config.flags.cleanup_after_test {
            warn!(
                cluster_id = %lease.cluster_id(),
                "Cleanup disabled. Test cluster was NOT deleted"
            );
            lease.release();
            return false;
        }

        let policy = CleanupPolicy {
            settle_delay: self.config.timing.cleanup_settle,
            retry_cooldown: self.config.timing.cleanup_retry_cooldown,
        };
        let outcome = cleanup_test_resources(
            self.rds,
            lease.cluster_id(),
            &[lease.instance_id().to_string()],
            policy,
            self.cancel.as_ref(),
        )
        .await;
        lease.release();

        outcome.completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::rds::MockRdsOperations;
    use crate::aws::{ClusterDescription, InstanceDescription, RdsError, Snapshot};
    use report::MockReportingSink;
    use std::time::Duration;

    fn config(cleanup: bool) -> DrillConfig {
        let mut config = DrillConfig::default();
        config.target.subnet_group = "db-subnets".into();
        config.flags.cleanup_after_test = cleanup;
        config.timing.cleanup_settle = Duration::from_secs(1);
        config.timing.cleanup_retry_cooldown = Duration::from_secs(1);
        config
    }

    fn reporting_once() -> MockReportingSink {
        let mut sink = MockReportingSink::new();
        sink.expect_publish_metrics().times(1).returning(|_| Ok(()));
        sink.expect_send_notification().times(1).returning(|_| Ok(()));
        sink
    }

    fn one_snapshot(rds: &mut MockRdsOperations) {
        rds.expect_describe_cluster_snapshots().returning(|cluster, kind| {
            Ok(vec![Snapshot {
                id: "rds:prod-db-1".into(),
                cluster_id: cluster.to_string(),
                created_at: None,
                status: "available".into(),
                kind: Some(kind),
                engine: "aurora-postgresql".into(),
                engine_version: None,
            }])
        });
    }

    #[tokio::test]
    async fn missing_cluster_identifier_still_reports() {
        let rds = MockRdsOperations::new();
        let sink = reporting_once();
        let config = config(true);

        let result = RestoreDrill::new(&rds, &sink, &config).run(None).await;

        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("No RDS cluster identifier provided")
        );
        assert!(result.test_cluster_id.is_none());
        assert!(!result.cleanup_completed);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_restore_still_cleans_up() {
        let mut rds = MockRdsOperations::new();
        one_snapshot(&mut rds);
        rds.expect_restore_cluster_from_snapshot()
            .times(1)
            .returning(|_| Err(RdsError::Throttled("Rate exceeded".into())));
        rds.expect_describe_cluster().never();
        rds.expect_delete_instance()
            .times(1)
            .returning(|id| Err(RdsError::missing("DBInstanceNotFound", id)));
        rds.expect_delete_cluster()
            .times(1)
            .returning(|id| Err(RdsError::missing("DBClusterNotFoundFault", id)));
        let sink = reporting_once();
        let config = config(true);

        let result = RestoreDrill::new(&rds, &sink, &config)
            .run(Some("prod-db"))
            .await;

        assert!(!result.success);
        assert!(result.test_cluster_id.is_some());
        assert!(result.cleanup_completed);
        assert!(
            result
                .error_message
                .unwrap()
                .starts_with("Failed to initiate cluster restoration")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_routes_through_cleanup() {
        let mut rds = MockRdsOperations::new();
        one_snapshot(&mut rds);
        rds.expect_restore_cluster_from_snapshot().returning(|_| Ok(()));
        rds.expect_describe_cluster().returning(|id| {
            Ok(ClusterDescription {
                id: id.to_string(),
                status: "creating".into(),
                ..Default::default()
            })
        });
        rds.expect_describe_instance().never();
        rds.expect_delete_instance().times(1).returning(|_| Ok(()));
        rds.expect_delete_cluster().times(1).returning(|_| Ok(()));
        let sink = reporting_once();
        let config = config(true);

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(95)).await;
            canceller.cancel();
        });

        let result = RestoreDrill::new(&rds, &sink, &config)
            .with_cancellation(token)
            .run(Some("prod-db"))
            .await;

        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("cancelled"));
        assert!(result.cleanup_completed);
    }

    #[tokio::test(start_paused = true)]
    async fn instance_failure_aborts_before_verification() {
        let mut rds = MockRdsOperations::new();
        one_snapshot(&mut rds);
        rds.expect_restore_cluster_from_snapshot().returning(|_| Ok(()));
        rds.expect_describe_cluster().times(1).returning(|id| {
            Ok(ClusterDescription {
                id: id.to_string(),
                status: "available".into(),
                ..Default::default()
            })
        });
        rds.expect_create_instance().times(1).returning(|_| Ok(()));
        rds.expect_describe_instance().returning(|id| {
            Ok(InstanceDescription {
                id: id.to_string(),
                status: "incompatible-restore".into(),
            })
        });
        rds.expect_delete_instance().times(1).returning(|_| Ok(()));
        rds.expect_delete_cluster().times(1).returning(|_| Ok(()));
        let sink = reporting_once();
        let config = config(true);

        let result = RestoreDrill::new(&rds, &sink, &config)
            .run(Some("prod-db"))
            .await;

        assert!(!result.success);
        assert!(!result.connectivity_test_passed);
        assert!(result.data_integrity_tests.is_empty());
        assert_eq!(result.restore_duration_minutes, 0);
        assert!(result.restore_end_time.is_none());
    }
}
