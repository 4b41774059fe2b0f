//! restore-drill: end-to-end backup restoration drills for Aurora clusters
//!
//! A drill restores the newest snapshot of a cluster into a throwaway test
//! cluster, waits for it, checks it, tears it down and reports the outcome.
//!
//! ## Modules
//!
//! - [`aws`]: RDS, CloudWatch and SNS clients
//! - [`config`]: Drill configuration and validation
//! - [`error`]: Fatal drill errors and configuration errors
//! - [`orchestrator`]: Pipeline stages, cleanup, reporting and the orphan sweep
//! - [`wait`]: Availability polling for restored resources

pub mod aws;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod wait;

pub use config::DrillConfig;
pub use error::{ConfigError, DrillError};
pub use orchestrator::RestoreDrill;
