//! Configuration types for the restore drill
//!
//! Everything is resolved once at process start (see `main.rs`) and passed by
//! reference from there on. Nothing below reads the environment.

use crate::error::ConfigError;
use crate::orchestrator::identity::longest_identifier_len;
use restore_drill_common::defaults::{
    CLEANUP_RETRY_COOLDOWN, CLEANUP_SETTLE_DELAY, DEFAULT_ENVIRONMENT, DEFAULT_INSTANCE_WAIT_MINUTES,
    DEFAULT_MAX_WAIT_MINUTES, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROJECT_NAME,
    DEFAULT_REGION_NAME, DEFAULT_TEST_INSTANCE_CLASS, MAX_CLUSTER_IDENTIFIER_LEN,
};
use restore_drill_common::metrics::DEFAULT_NAMESPACE;
use std::time::Duration;

/// Deployment identity, used for naming, tagging and metric dimensions
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Project name (e.g., "unified-health")
    pub project: String,
    /// Environment name (e.g., "prod")
    pub environment: String,
    /// Region label, distinct from the AWS region (e.g., "americas")
    pub region_name: String,
}

/// AWS client configuration
#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    /// AWS region; falls back to the SDK's default resolution
    pub region: Option<String>,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

/// Where and how the test cluster is restored
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Default source cluster; trigger events may override it
    pub cluster_identifier: Option<String>,
    pub subnet_group: String,
    pub security_group_ids: Vec<String>,
    pub instance_class: String,
}

/// Externally supplied integrity queries
#[derive(Debug, Clone, Default)]
pub struct VerificationConfig {
    /// Opaque query strings, recorded but not executed
    pub test_queries: Vec<String>,
}

/// Metric and notification destinations
#[derive(Debug, Clone)]
pub struct ReportingConfig {
    /// Notifications are skipped when unset
    pub sns_topic_arn: Option<String>,
    pub metrics_namespace: String,
}

/// Time budgets and fixed delays
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Budget for the restored cluster to become available
    pub cluster_wait: Duration,
    /// Budget for the test instance to become available
    pub instance_wait: Duration,
    pub poll_interval: Duration,
    /// Pause between instance and cluster deletion
    pub cleanup_settle: Duration,
    /// Cooldown before the single cluster-deletion retry
    pub cleanup_retry_cooldown: Duration,
}

/// Runtime behavior flags
#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    /// Delete the test cluster when the drill ends
    pub cleanup_after_test: bool,
}

/// Configuration for a drill
///
/// Composed of focused sub-configs; components take the piece they need.
#[derive(Debug, Clone)]
pub struct DrillConfig {
    pub identity: IdentityConfig,
    pub aws: AwsConfig,
    pub target: TargetConfig,
    pub verification: VerificationConfig,
    pub reporting: ReportingConfig,
    pub timing: TimingConfig,
    pub flags: RuntimeFlags,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig {
                project: DEFAULT_PROJECT_NAME.to_string(),
                environment: DEFAULT_ENVIRONMENT.to_string(),
                region_name: DEFAULT_REGION_NAME.to_string(),
            },
            aws: AwsConfig::default(),
            target: TargetConfig {
                cluster_identifier: None,
                subnet_group: String::new(),
                security_group_ids: Vec::new(),
                instance_class: DEFAULT_TEST_INSTANCE_CLASS.to_string(),
            },
            verification: VerificationConfig::default(),
            reporting: ReportingConfig {
                sns_topic_arn: None,
                metrics_namespace: DEFAULT_NAMESPACE.to_string(),
            },
            timing: TimingConfig {
                cluster_wait: Duration::from_secs(DEFAULT_MAX_WAIT_MINUTES * 60),
                instance_wait: Duration::from_secs(DEFAULT_INSTANCE_WAIT_MINUTES * 60),
                poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
                cleanup_settle: CLEANUP_SETTLE_DELAY,
                cleanup_retry_cooldown: CLEANUP_RETRY_COOLDOWN,
            },
            flags: RuntimeFlags {
                cleanup_after_test: true,
            },
        }
    }
}

impl DrillConfig {
    /// Check everything that can be checked before any AWS call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let identity = [
            ("PROJECT_NAME", &self.identity.project),
            ("ENVIRONMENT", &self.identity.environment),
            ("REGION_NAME", &self.identity.region_name),
        ];
        for (field, value) in identity {
            if value.is_empty() {
                return Err(ConfigError::Empty { field });
            }
            if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(ConfigError::InvalidIdentifierPart {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.target.instance_class.is_empty() {
            return Err(ConfigError::Empty {
                field: "TEST_INSTANCE_CLASS",
            });
        }
        if self.reporting.metrics_namespace.is_empty() {
            return Err(ConfigError::Empty {
                field: "METRICS_NAMESPACE",
            });
        }

        let durations = [
            ("MAX_WAIT_MINUTES", self.timing.cluster_wait),
            ("INSTANCE_WAIT_MINUTES", self.timing.instance_wait),
            ("POLL_INTERVAL_SECS", self.timing.poll_interval),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }

        Ok(())
    }

    /// Additional checks for running a drill (sweeping does not restore anything)
    pub fn validate_for_run(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.target.subnet_group.is_empty() {
            return Err(ConfigError::Empty {
                field: "DB_SUBNET_GROUP_NAME",
            });
        }

        let length = longest_identifier_len(&self.identity);
        if length > MAX_CLUSTER_IDENTIFIER_LEN {
            return Err(ConfigError::IdentifierTooLong {
                length,
                max: MAX_CLUSTER_IDENTIFIER_LEN,
            });
        }
        Ok(())
    }

    /// Default age after which a leftover test cluster is considered orphaned
    pub fn orphan_age(&self) -> Duration {
        self.timing.cluster_wait.saturating_add(self.timing.instance_wait)
    }
}

/// Convert a minutes setting to a `Duration`, rejecting values that overflow.
pub fn minutes(field: &'static str, minutes: u64) -> Result<Duration, ConfigError> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or(ConfigError::DurationOverflow { field, minutes })
}

/// Parse a comma-separated id list, dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `TEST_QUERIES`: a JSON array of strings. Empty input means no queries.
pub fn parse_test_queries(raw: &str) -> Result<Vec<String>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}
