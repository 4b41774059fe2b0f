//! RDS cluster, instance and snapshot management

mod operations;
mod types;

pub use operations::RdsOperations;
pub use types::{
    ClusterDescription, CreateInstanceRequest, InstanceDescription, RestoreClusterRequest,
    Snapshot,
};

#[cfg(test)]
pub use operations::MockRdsOperations;

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{RdsError, classify_sdk_error};
use aws_sdk_rds::Client;
use aws_sdk_rds::types::{DbCluster, DbClusterSnapshot, Tag};
use chrono::{DateTime, Utc};
use restore_drill_common::SnapshotKind;
use restore_drill_common::defaults::SNAPSHOT_PAGE_SIZE;
use tracing::{debug, info};

/// RDS client for restore drills
pub struct RdsClient {
    pub(crate) client: Client,
}

impl FromAwsContext for RdsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
        }
    }
}

impl RdsClient {
    /// List up to one page of snapshots of `kind` for `cluster_id`.
    pub async fn describe_cluster_snapshots(
        &self,
        cluster_id: &str,
        kind: SnapshotKind,
    ) -> Result<Vec<Snapshot>, RdsError> {
        let response = self
            .client
            .describe_db_cluster_snapshots()
            .db_cluster_identifier(cluster_id)
            .snapshot_type(kind.as_ref())
            .max_records(SNAPSHOT_PAGE_SIZE)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let snapshots: Vec<Snapshot> = response
            .db_cluster_snapshots()
            .iter()
            .filter_map(snapshot_from_sdk)
            .collect();

        debug!(cluster_id = %cluster_id, kind = %kind, count = snapshots.len(), "Described snapshots");
        Ok(snapshots)
    }

    /// Start a cluster restore. Returns once RDS accepted the request.
    pub async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<(), RdsError> {
        debug!(
            cluster_id = %request.cluster_id,
            snapshot_id = %request.snapshot_id,
            engine = %request.engine,
            "Restoring cluster from snapshot"
        );

        let security_groups: Vec<String> = request
            .security_group_ids
            .into_iter()
            .filter(|sg| !sg.is_empty())
            .collect();

        self.client
            .restore_db_cluster_from_snapshot()
            .db_cluster_identifier(&request.cluster_id)
            .snapshot_identifier(&request.snapshot_id)
            .engine(&request.engine)
            .set_engine_version(request.engine_version)
            .db_subnet_group_name(&request.subnet_group)
            .set_vpc_security_group_ids(Some(security_groups))
            .deletion_protection(false)
            .copy_tags_to_snapshot(false)
            .set_tags(Some(sdk_tags(&request.tags)))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(())
    }

    /// Start creating an instance attached to a cluster.
    pub async fn create_instance(&self, request: CreateInstanceRequest) -> Result<(), RdsError> {
        debug!(
            instance_id = %request.instance_id,
            cluster_id = %request.cluster_id,
            instance_class = %request.instance_class,
            "Creating test instance"
        );

        self.client
            .create_db_instance()
            .db_instance_identifier(&request.instance_id)
            .db_instance_class(&request.instance_class)
            .engine(&request.engine)
            .db_cluster_identifier(&request.cluster_id)
            .publicly_accessible(false)
            .set_tags(Some(sdk_tags(&request.tags)))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(())
    }

    pub async fn describe_cluster(&self, cluster_id: &str) -> Result<ClusterDescription, RdsError> {
        let response = self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(cluster_id)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        response
            .db_clusters()
            .first()
            .map(cluster_from_sdk)
            .ok_or_else(|| RdsError::missing("DBClusterNotFoundFault", cluster_id))
    }

    pub async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceDescription, RdsError> {
        let response = self
            .client
            .describe_db_instances()
            .db_instance_identifier(instance_id)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        response
            .db_instances()
            .first()
            .map(|instance| InstanceDescription {
                id: instance
                    .db_instance_identifier()
                    .unwrap_or(instance_id)
                    .to_string(),
                status: instance.db_instance_status().unwrap_or_default().to_string(),
            })
            .ok_or_else(|| RdsError::missing("DBInstanceNotFound", instance_id))
    }

    pub async fn delete_instance(&self, instance_id: &str) -> Result<(), RdsError> {
        info!(instance_id = %instance_id, "Deleting instance");

        self.client
            .delete_db_instance()
            .db_instance_identifier(instance_id)
            .skip_final_snapshot(true)
            .delete_automated_backups(true)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(())
    }

    pub async fn delete_cluster(&self, cluster_id: &str) -> Result<(), RdsError> {
        info!(cluster_id = %cluster_id, "Deleting cluster");

        self.client
            .delete_db_cluster()
            .db_cluster_identifier(cluster_id)
            .skip_final_snapshot(true)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(())
    }

    /// List all clusters, following pagination markers.
    pub async fn list_clusters(&self) -> Result<Vec<ClusterDescription>, RdsError> {
        let mut clusters = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_db_clusters()
                .max_records(100)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(classify_sdk_error)?;

            clusters.extend(response.db_clusters().iter().map(cluster_from_sdk));

            match response.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(count = clusters.len(), "Listed clusters");
        Ok(clusters)
    }
}

fn sdk_tags(tags: &[(String, String)]) -> Vec<Tag> {
    tags.iter()
        .map(|(k, v)| Tag::builder().key(k).value(v).build())
        .collect()
}

fn to_chrono(time: &aws_sdk_rds::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

fn snapshot_from_sdk(snapshot: &DbClusterSnapshot) -> Option<Snapshot> {
    Some(Snapshot {
        id: snapshot.db_cluster_snapshot_identifier()?.to_string(),
        cluster_id: snapshot.db_cluster_identifier().unwrap_or_default().to_string(),
        created_at: snapshot.snapshot_create_time().and_then(to_chrono),
        status: snapshot.status().unwrap_or_default().to_string(),
        kind: snapshot.snapshot_type().and_then(|t| t.parse().ok()),
        engine: snapshot.engine().unwrap_or_default().to_string(),
        engine_version: snapshot.engine_version().map(str::to_string),
    })
}

fn cluster_from_sdk(cluster: &DbCluster) -> ClusterDescription {
    ClusterDescription {
        id: cluster.db_cluster_identifier().unwrap_or_default().to_string(),
        status: cluster.status().unwrap_or_default().to_string(),
        endpoint: cluster
            .endpoint()
            .filter(|e| !e.is_empty())
            .map(str::to_string),
        storage_encrypted: cluster.storage_encrypted().unwrap_or(false),
        multi_az: cluster.multi_az().unwrap_or(false),
        member_ids: cluster
            .db_cluster_members()
            .iter()
            .filter_map(|m| m.db_instance_identifier())
            .map(str::to_string)
            .collect(),
        created_at: cluster.cluster_create_time().and_then(to_chrono),
        tags: cluster
            .tag_list()
            .iter()
            .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
            .collect(),
    }
}
