//! RDS operations trait for testing

use super::RdsClient;
use super::types::{
    ClusterDescription, CreateInstanceRequest, InstanceDescription, RestoreClusterRequest,
    Snapshot,
};
use crate::aws::error::RdsError;
use restore_drill_common::SnapshotKind;

/// The control-plane calls the drill makes.
///
/// This trait abstracts the RDS client so that orchestration logic (locating,
/// waiting, verifying, cleaning up) can be tested without hitting real AWS.
/// Absent resources are reported as [`RdsError::NotFound`], never as `Ok`.
#[allow(async_fn_in_trait)] // Driven from a single task, no Send bound needed on futures
#[cfg_attr(test, mockall::automock)]
pub trait RdsOperations: Send + Sync {
    /// List snapshots of one kind for a cluster
    async fn describe_cluster_snapshots(
        &self,
        cluster_id: &str,
        kind: SnapshotKind,
    ) -> Result<Vec<Snapshot>, RdsError>;

    /// Start restoring a new cluster from a snapshot
    async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<(), RdsError>;

    /// Start creating an instance inside a cluster
    async fn create_instance(&self, request: CreateInstanceRequest) -> Result<(), RdsError>;

    /// Describe a single cluster
    async fn describe_cluster(&self, cluster_id: &str) -> Result<ClusterDescription, RdsError>;

    /// Describe a single instance
    async fn describe_instance(&self, instance_id: &str)
    -> Result<InstanceDescription, RdsError>;

    /// Delete an instance without a final snapshot, discarding automated backups
    async fn delete_instance(&self, instance_id: &str) -> Result<(), RdsError>;

    /// Delete a cluster without a final snapshot
    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), RdsError>;

    /// List every cluster visible in the region
    async fn list_clusters(&self) -> Result<Vec<ClusterDescription>, RdsError>;
}

impl RdsOperations for RdsClient {
    async fn describe_cluster_snapshots(
        &self,
        cluster_id: &str,
        kind: SnapshotKind,
    ) -> Result<Vec<Snapshot>, RdsError> {
        RdsClient::describe_cluster_snapshots(self, cluster_id, kind).await
    }

    async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<(), RdsError> {
        RdsClient::restore_cluster_from_snapshot(self, request).await
    }

    async fn create_instance(&self, request: CreateInstanceRequest) -> Result<(), RdsError> {
        RdsClient::create_instance(self, request).await
    }

    async fn describe_cluster(&self, cluster_id: &str) -> Result<ClusterDescription, RdsError> {
        RdsClient::describe_cluster(self, cluster_id).await
    }

    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceDescription, RdsError> {
        RdsClient::describe_instance(self, instance_id).await
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<(), RdsError> {
        RdsClient::delete_instance(self, instance_id).await
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), RdsError> {
        RdsClient::delete_cluster(self, cluster_id).await
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterDescription>, RdsError> {
        RdsClient::list_clusters(self).await
    }
}
