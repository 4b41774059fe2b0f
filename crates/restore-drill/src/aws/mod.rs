//! AWS client modules for the restore drill
//!
//! This module provides wrappers around AWS SDK clients for:
//! - RDS: snapshot lookup, cluster restore, instance provisioning and teardown
//! - CloudWatch: drill outcome metrics
//! - SNS: drill outcome notifications

pub mod cloudwatch;
pub mod context;
pub mod error;
pub mod rds;
pub mod sns;

pub use cloudwatch::CloudWatchMetrics;
pub use context::{AwsContext, FromAwsContext};
pub use error::{RdsError, classify_rds_error, classify_sdk_error};
pub use rds::{
    ClusterDescription, CreateInstanceRequest, InstanceDescription, RdsClient, RdsOperations,
    RestoreClusterRequest, Snapshot,
};
pub use sns::SnsNotifier;
