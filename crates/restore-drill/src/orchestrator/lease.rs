//! Ownership handle for an ephemeral test cluster

use tracing::error;

/// Marks a test cluster as owned by the running drill.
///
/// Taken as soon as the restore is attempted and handed back only through
/// [`ClusterLease::release`], after cleanup has been decided. A lease dropped
/// any other way (the drill future was dropped mid-run) logs the leaked
/// cluster so an operator or `restore-drill sweep` can remove it.
#[must_use = "a test cluster lease must be released after cleanup"]
#[derive(Debug)]
pub struct ClusterLease {
    cluster_id: String,
    instance_id: String,
    released: bool,
}

impl ClusterLease {
    pub fn acquire(cluster_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            instance_id: instance_id.into(),
            released: false,
        }
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Give up ownership; cleanup has been handled.
    pub fn release(mut self) {
        self.released = true;
    }
}

impl Drop for ClusterLease {
    fn drop(&mut self) {
        if !self.released {
            error!(
                cluster_id = %self.cluster_id,
                instance_id = %self.instance_id,
                "Test cluster leaked without cleanup; run `restore-drill sweep` to remove it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_consumes_lease() {
        let lease = ClusterLease::acquire("c", "c-inst-1");
        assert_eq!(lease.cluster_id(), "c");
        assert_eq!(lease.instance_id(), "c-inst-1");
        let () = lease.release();
    }

    #[test]
    fn dropping_unreleased_lease_does_not_panic() {
        let lease = ClusterLease::acquire("c", "c-inst-1");
        drop(lease);
    }
}
