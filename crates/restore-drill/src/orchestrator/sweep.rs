//! Tag-based sweep of orphaned test clusters
//!
//! A drill killed mid-run never reaches its cleanup. This finds clusters that
//! carry the restore-test tags, match this deployment's identifier prefix and
//! are older than any drill could legitimately run, then tears them down with
//! the same routine a drill uses.

use super::cleanup::{CleanupOutcome, CleanupPolicy, cleanup_test_resources};
use super::identity::{identifier_prefix, instance_identifier};
use crate::aws::{ClusterDescription, RdsError, RdsOperations};
use crate::config::IdentityConfig;
use chrono::{DateTime, Utc};
use restore_drill_common::tags::is_restore_test_resource;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Status of a cluster whose deletion is already under way
const DELETING: &str = "deleting";

/// Sweep configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Minimum age before a test cluster is considered orphaned
    pub min_age: Duration,
    /// Report only, delete nothing
    pub dry_run: bool,
}

/// A test cluster selected for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedCluster {
    pub cluster_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub instance_ids: Vec<String>,
}

/// Report of a sweep
#[derive(Default, Debug)]
pub struct SweepReport {
    /// Clusters visible in the region
    pub scanned: usize,
    pub orphaned: Vec<OrphanedCluster>,
    pub deleted: usize,
    pub failed: usize,
    /// Test clusters left alone (too young, already deleting, or undated)
    pub skipped: usize,
    pub outcomes: Vec<CleanupOutcome>,
}

/// Select orphaned test clusters from a listing.
///
/// Returns the orphans and how many matching test clusters were skipped.
pub fn find_orphans(
    clusters: &[ClusterDescription],
    identity: &IdentityConfig,
    min_age: Duration,
    now: DateTime<Utc>,
) -> (Vec<OrphanedCluster>, usize) {
    let prefix = identifier_prefix(identity);
    let mut orphans = Vec::new();
    let mut skipped = 0;

    for cluster in clusters {
        if !cluster.id.starts_with(&prefix)
            || !is_restore_test_resource(cluster.tag_pairs(), &identity.project)
        {
            continue;
        }

        let Some(created_at) = cluster.created_at else {
            debug!(cluster_id = %cluster.id, "Skipping test cluster without creation time");
            skipped += 1;
            continue;
        };
        let age = (now - created_at).to_std().unwrap_or_default();
        if age < min_age || cluster.status == DELETING {
            debug!(
                cluster_id = %cluster.id,
                status = %cluster.status,
                age_secs = age.as_secs(),
                "Skipping test cluster"
            );
            skipped += 1;
            continue;
        }

        let mut instance_ids = cluster.member_ids.clone();
        let conventional = instance_identifier(&cluster.id);
        if !instance_ids.contains(&conventional) {
            instance_ids.push(conventional);
        }

        orphans.push(OrphanedCluster {
            cluster_id: cluster.id.clone(),
            status: cluster.status.clone(),
            created_at,
            instance_ids,
        });
    }

    (orphans, skipped)
}

/// Find orphaned test clusters and, unless dry-running, delete them.
pub async fn sweep_orphans<R: RdsOperations>(
    rds: &R,
    identity: &IdentityConfig,
    config: &SweepConfig,
    policy: CleanupPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<SweepReport, RdsError> {
    let clusters = rds.list_clusters().await?;
    let (orphaned, skipped) = find_orphans(&clusters, identity, config.min_age, Utc::now());

    info!(
        scanned = clusters.len(),
        orphaned = orphaned.len(),
        skipped,
        dry_run = config.dry_run,
        "Sweep scan complete"
    );

    let mut report = SweepReport {
        scanned: clusters.len(),
        skipped,
        ..Default::default()
    };

    if !config.dry_run {
        for orphan in &orphaned {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                warn!("Sweep cancelled, leaving remaining clusters");
                break;
            }
            let outcome = cleanup_test_resources(
                rds,
                &orphan.cluster_id,
                &orphan.instance_ids,
                policy,
                cancel,
            )
            .await;
            if outcome.completed() {
                report.deleted += 1;
            } else {
                report.failed += 1;
            }
            report.outcomes.push(outcome);
        }
    }

    report.orphaned = orphaned;
    Ok(report)
}
