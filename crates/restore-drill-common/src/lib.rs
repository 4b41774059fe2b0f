//! restore-drill-common - Shared types and constants
//!
//! This crate holds the types shared by the restore drill orchestrator and
//! anything that consumes its output, without any AWS SDK dependencies.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`metrics`]: CloudWatch namespace, metric and dimension names
//! - [`result`]: The test run result record and its response envelope
//! - [`status`]: Control-plane status sentinels and failure sets
//! - [`tags`]: Tags applied to ephemeral test resources

pub mod defaults;
pub mod metrics;
pub mod result;
pub mod status;
pub mod tags;

pub use result::{IntegrityTestRecord, RunResponse, TestRunResult};
pub use status::{SnapshotKind, StatusPolicy};
