//! Snapshot Locator
//!
//! Finds the newest usable snapshot of the source cluster. Read-only and never
//! retried: a missing snapshot is not something polling will fix.

use crate::aws::{RdsOperations, Snapshot};
use crate::error::DrillError;
use restore_drill_common::SnapshotKind;
use restore_drill_common::status::AVAILABLE;
use tracing::{debug, info};

/// Locate the most recent `available` snapshot of `cluster_id`.
///
/// Manual snapshots are only consulted when the cluster has no automated
/// snapshots at all, whatever their status.
pub async fn locate_latest_snapshot<R: RdsOperations>(
    rds: &R,
    cluster_id: &str,
) -> Result<Snapshot, DrillError> {
    let lookup = |source| DrillError::SnapshotLookup {
        cluster_id: cluster_id.to_string(),
        source,
    };

    let mut candidates = rds
        .describe_cluster_snapshots(cluster_id, SnapshotKind::Automated)
        .await
        .map_err(lookup)?;
    debug!(cluster_id = %cluster_id, count = candidates.len(), "Automated snapshots found");

    if candidates.is_empty() {
        candidates = rds
            .describe_cluster_snapshots(cluster_id, SnapshotKind::Manual)
            .await
            .map_err(lookup)?;
        debug!(cluster_id = %cluster_id, count = candidates.len(), "Manual snapshots found");
    }

    let snapshot = select_latest(candidates).ok_or_else(|| DrillError::NoSnapshotFound {
        cluster_id: cluster_id.to_string(),
    })?;

    info!(
        snapshot_id = %snapshot.id,
        created_at = ?snapshot.created_at,
        kind = ?snapshot.kind,
        "Selected snapshot"
    );
    Ok(snapshot)
}

/// Pick the newest available snapshot.
///
/// Ties on creation time go to the lexicographically greatest id, and a
/// snapshot without a creation time sorts before every dated one.
pub fn select_latest(candidates: impl IntoIterator<Item = Snapshot>) -> Option<Snapshot> {
    candidates
        .into_iter()
        .filter(|s| s.status == AVAILABLE)
        .max_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)))
}
