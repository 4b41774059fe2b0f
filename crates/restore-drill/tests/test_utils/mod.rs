//! Shared test utilities for integration tests
//!
//! [`FakeControlPlane`] plays back scripted statuses and records every call, so
//! scenarios can assert on what the drill asked RDS to do. [`RecordingSink`]
//! counts reporting deliveries.

#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use restore_drill::aws::{
    ClusterDescription, CreateInstanceRequest, InstanceDescription, RdsError, RdsOperations,
    RestoreClusterRequest, Snapshot,
};
use restore_drill::config::DrillConfig;
use restore_drill::orchestrator::{MetricBatch, Notification, ReportingSink};
use restore_drill_common::SnapshotKind;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const SOURCE_CLUSTER: &str = "unified-health-prod-aurora";

/// One recorded control-plane call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DescribeSnapshots(SnapshotKind),
    RestoreCluster(RestoreClusterRequest),
    CreateInstance(CreateInstanceRequest),
    DescribeCluster(String),
    DescribeInstance(String),
    DeleteInstance(String),
    DeleteCluster(String),
    ListClusters,
}

/// Scripted stand-in for RDS
///
/// Status scripts are consumed one entry per describe call and the last entry
/// repeats. An empty script means the resource is not found.
#[derive(Default)]
pub struct FakeControlPlane {
    automated: Vec<Snapshot>,
    manual: Vec<Snapshot>,
    restore_error: Mutex<Option<RdsError>>,
    create_instance_error: Mutex<Option<RdsError>>,
    /// Replaces the generated endpoint of an available cluster when set
    endpoint_override: Option<Option<String>>,
    cluster_statuses: Mutex<VecDeque<String>>,
    instance_statuses: Mutex<VecDeque<String>>,
    instance_delete_errors: Mutex<VecDeque<RdsError>>,
    cluster_delete_errors: Mutex<VecDeque<RdsError>>,
    storage_encrypted: bool,
    calls: Mutex<Vec<Call>>,
}

pub fn snapshot_at(id: &str, created_at: DateTime<Utc>, status: &str) -> Snapshot {
    Snapshot {
        id: id.to_string(),
        cluster_id: SOURCE_CLUSTER.to_string(),
        created_at: Some(created_at),
        status: status.to_string(),
        kind: Some(SnapshotKind::Automated),
        engine: "aurora-postgresql".to_string(),
        engine_version: Some("15.4".to_string()),
    }
}

/// T0 for scenario snapshots
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 3, 0, 0).unwrap()
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self {
            storage_encrypted: true,
            ..Default::default()
        }
    }

    /// One available automated snapshot at T0; cluster and instance come up.
    pub fn healthy() -> Self {
        Self::new()
            .with_automated(vec![snapshot_at("rds:prod-2026-05-04-03-00", t0(), "available")])
            .with_cluster_statuses(&["creating", "backing-up", "available"])
            .with_instance_statuses(&["creating", "available"])
    }

    pub fn with_automated(mut self, snapshots: Vec<Snapshot>) -> Self {
        self.automated = snapshots;
        self
    }

    pub fn with_manual(mut self, snapshots: Vec<Snapshot>) -> Self {
        self.manual = snapshots;
        self
    }

    pub fn with_cluster_statuses(self, statuses: &[&str]) -> Self {
        *self.cluster_statuses.lock().unwrap() = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_instance_statuses(self, statuses: &[&str]) -> Self {
        *self.instance_statuses.lock().unwrap() =
            statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_restore_error(self, error: RdsError) -> Self {
        *self.restore_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_create_instance_error(self, error: RdsError) -> Self {
        *self.create_instance_error.lock().unwrap() = Some(error);
        self
    }

    /// Endpoint reported once the cluster is available (`None` hides it).
    pub fn with_connectivity_endpoint(mut self, endpoint: Option<&str>) -> Self {
        self.endpoint_override = Some(endpoint.map(str::to_string));
        self
    }

    pub fn with_instance_delete_errors(self, errors: Vec<RdsError>) -> Self {
        *self.instance_delete_errors.lock().unwrap() = errors.into();
        self
    }

    pub fn with_cluster_delete_errors(self, errors: Vec<RdsError>) -> Self {
        *self.cluster_delete_errors.lock().unwrap() = errors.into();
        self
    }

    pub fn with_storage_encrypted(mut self, encrypted: bool) -> Self {
        self.storage_encrypted = encrypted;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn delete_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::DeleteInstance(_) | Call::DeleteCluster(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_status(script: &Mutex<VecDeque<String>>) -> Option<String> {
        let mut script = script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }

    fn restored_cluster(&self) -> Option<RestoreClusterRequest> {
        self.calls().into_iter().find_map(|c| match c {
            Call::RestoreCluster(request) => Some(request),
            _ => None,
        })
    }

    fn created_instance(&self) -> Option<String> {
        self.calls().into_iter().find_map(|c| match c {
            Call::CreateInstance(request) => Some(request.instance_id),
            _ => None,
        })
    }
}

impl RdsOperations for FakeControlPlane {
    async fn describe_cluster_snapshots(
        &self,
        _cluster_id: &str,
        kind: SnapshotKind,
    ) -> Result<Vec<Snapshot>, RdsError> {
        self.record(Call::DescribeSnapshots(kind));
        Ok(match kind {
            SnapshotKind::Automated => self.automated.clone(),
            SnapshotKind::Manual => self.manual.clone(),
        })
    }

    async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<(), RdsError> {
        self.record(Call::RestoreCluster(request));
        match self.restore_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn create_instance(&self, request: CreateInstanceRequest) -> Result<(), RdsError> {
        self.record(Call::CreateInstance(request));
        match self.create_instance_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn describe_cluster(&self, cluster_id: &str) -> Result<ClusterDescription, RdsError> {
        self.record(Call::DescribeCluster(cluster_id.to_string()));
        let restored = self
            .restored_cluster()
            .filter(|r| r.cluster_id == cluster_id)
            .ok_or_else(|| RdsError::missing("DBClusterNotFoundFault", cluster_id))?;
        let status = Self::next_status(&self.cluster_statuses)
            .ok_or_else(|| RdsError::missing("DBClusterNotFoundFault", cluster_id))?;

        Ok(ClusterDescription {
            id: restored.cluster_id.clone(),
            endpoint: (status == "available")
                .then(|| match &self.endpoint_override {
                    Some(endpoint) => endpoint.clone(),
                    None => Some(format!(
                        "{}.cluster-abc123.us-east-1.rds.amazonaws.com",
                        cluster_id
                    )),
                })
                .flatten(),
            status,
            storage_encrypted: self.storage_encrypted,
            multi_az: true,
            member_ids: self.created_instance().into_iter().collect(),
            created_at: Some(Utc::now()),
            tags: restored.tags,
        })
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceDescription, RdsError> {
        self.record(Call::DescribeInstance(instance_id.to_string()));
        let status = Self::next_status(&self.instance_statuses)
            .ok_or_else(|| RdsError::missing("DBInstanceNotFound", instance_id))?;
        Ok(InstanceDescription {
            id: instance_id.to_string(),
            status,
        })
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<(), RdsError> {
        self.record(Call::DeleteInstance(instance_id.to_string()));
        match self.instance_delete_errors.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), RdsError> {
        self.record(Call::DeleteCluster(cluster_id.to_string()));
        match self.cluster_delete_errors.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterDescription>, RdsError> {
        self.record(Call::ListClusters);
        Ok(Vec::new())
    }
}

/// Reporting sink that records deliveries
#[derive(Default)]
pub struct RecordingSink {
    pub batches: Mutex<Vec<MetricBatch>>,
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn metric_calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn notification_calls(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    pub fn metric_names(&self) -> Vec<&'static str> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.samples.iter().map(|s| s.name))
            .collect()
    }
}

impl ReportingSink for RecordingSink {
    async fn publish_metrics(&self, batch: &MetricBatch) -> Result<()> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }

    async fn send_notification(&self, notification: &Notification) -> Result<()> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Default configuration with the fields a run requires
pub fn test_config() -> DrillConfig {
    let mut config = DrillConfig::default();
    config.target.cluster_identifier = Some(SOURCE_CLUSTER.to_string());
    config.target.subnet_group = "restore-test-subnets".to_string();
    config.target.security_group_ids = vec!["sg-0123456789abcdef0".to_string()];
    config
}

pub fn invalid_state() -> RdsError {
    RdsError::InvalidState {
        code: "InvalidDBClusterStateFault".into(),
        message: "DB cluster is not in an available state".into(),
    }
}
