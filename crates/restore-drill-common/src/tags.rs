//! Tags applied to ephemeral restore-test resources
//!
//! Every cluster and instance created by a drill carries these tags so the
//! sweeper can find resources orphaned by a killed run.
//!
//! | Tag Key | Value |
//! |---------|-------|
//! | `Name` | Resource identifier |
//! | `Purpose` | `BackupRestoreTest` |
//! | `Project` | Configured project name (cluster only) |
//! | `Environment` | Configured environment (cluster only) |
//! | `AutoDelete` | `true` |
//! | `CreatedBy` | `backup-restore-test` (cluster only) |

pub const TAG_NAME: &str = "Name";

pub const TAG_PURPOSE: &str = "Purpose";

/// Purpose value identifying restore-test resources
pub const TAG_PURPOSE_VALUE: &str = "BackupRestoreTest";

pub const TAG_PROJECT: &str = "Project";

pub const TAG_ENVIRONMENT: &str = "Environment";

/// Marks the resource as disposable test infrastructure
pub const TAG_AUTO_DELETE: &str = "AutoDelete";

pub const TAG_AUTO_DELETE_VALUE: &str = "true";

pub const TAG_CREATED_BY: &str = "CreatedBy";

pub const TAG_CREATED_BY_VALUE: &str = "backup-restore-test";

/// Tags for a restored test cluster.
pub fn cluster_tags(cluster_id: &str, project: &str, environment: &str) -> Vec<(String, String)> {
    [
        (TAG_NAME, cluster_id),
        (TAG_PURPOSE, TAG_PURPOSE_VALUE),
        (TAG_PROJECT, project),
        (TAG_ENVIRONMENT, environment),
        (TAG_AUTO_DELETE, TAG_AUTO_DELETE_VALUE),
        (TAG_CREATED_BY, TAG_CREATED_BY_VALUE),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Tags for the test instance attached to a restored cluster.
pub fn instance_tags(instance_id: &str) -> Vec<(String, String)> {
    [
        (TAG_NAME, instance_id),
        (TAG_PURPOSE, TAG_PURPOSE_VALUE),
        (TAG_AUTO_DELETE, TAG_AUTO_DELETE_VALUE),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Whether a tag set marks a resource as restore-test infrastructure owned by `project`.
pub fn is_restore_test_resource<'a, I>(tags: I, project: &str) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let (mut purpose, mut auto_delete, mut owned) = (false, false, false);
    for (key, value) in tags {
        match key {
            TAG_PURPOSE => purpose = value == TAG_PURPOSE_VALUE,
            TAG_AUTO_DELETE => auto_delete = value == TAG_AUTO_DELETE_VALUE,
            TAG_PROJECT => owned = value == project,
            _ => {}
        }
    }
    purpose && auto_delete && owned
}
