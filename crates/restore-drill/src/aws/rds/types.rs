//! RDS types exchanged with the control plane

use chrono::{DateTime, Utc};
use restore_drill_common::SnapshotKind;

/// A cluster snapshot as observed through `DescribeDBClusterSnapshots`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: String,
    pub cluster_id: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Lifecycle status (`creating`, `available`, `failed`, ...)
    pub status: String,
    pub kind: Option<SnapshotKind>,
    pub engine: String,
    pub engine_version: Option<String>,
}

/// A cluster as observed through `DescribeDBClusters`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterDescription {
    pub id: String,
    pub status: String,
    /// Writer endpoint, populated once the cluster is available
    pub endpoint: Option<String>,
    pub storage_encrypted: bool,
    pub multi_az: bool,
    /// Instance identifiers of the cluster members
    pub member_ids: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub tags: Vec<(String, String)>,
}

impl ClusterDescription {
    /// Tags as borrowed key/value pairs
    pub fn tag_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A database instance as observed through `DescribeDBInstances`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDescription {
    pub id: String,
    pub status: String,
}

/// Parameters for `RestoreDBClusterFromSnapshot`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreClusterRequest {
    pub cluster_id: String,
    pub snapshot_id: String,
    pub engine: String,
    pub engine_version: Option<String>,
    pub subnet_group: String,
    pub security_group_ids: Vec<String>,
    pub tags: Vec<(String, String)>,
}

/// Parameters for `CreateDBInstance` inside an existing cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    pub instance_id: String,
    pub cluster_id: String,
    pub instance_class: String,
    pub engine: String,
    pub tags: Vec<(String, String)>,
}
