//! CloudWatch metric constants.
//!
//! The single source of truth for the namespace, metric names and dimension
//! names emitted at the end of every drill.

/// Default CloudWatch namespace for drill metrics
pub const DEFAULT_NAMESPACE: &str = "UnifiedHealth/BackupRestoreTesting";

/// Dimension names
pub mod dimensions {
    pub const PROJECT: &str = "Project";
    pub const ENVIRONMENT: &str = "Environment";
    pub const REGION: &str = "Region";
}

/// Metric names
pub mod names {
    pub const EXECUTED: &str = "RestoreTestExecuted";
    pub const SUCCESS: &str = "RestoreTestSuccess";
    pub const FAILURE: &str = "RestoreTestFailure";
    pub const RESTORE_MINUTES: &str = "RestoreTimeMinutes";
    pub const INTEGRITY_SUCCESS: &str = "DataIntegritySuccess";
    pub const INTEGRITY_FAILURE: &str = "DataIntegrityFailure";
}

/// Name of the run outcome counter for a given success flag.
pub fn outcome_metric(success: bool) -> &'static str {
    if success { names::SUCCESS } else { names::FAILURE }
}

/// Name of the integrity outcome counter for a given aggregate.
pub fn integrity_metric(passed: bool) -> &'static str {
    if passed {
        names::INTEGRITY_SUCCESS
    } else {
        names::INTEGRITY_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_names() {
        assert_eq!(outcome_metric(true), "RestoreTestSuccess");
        assert_eq!(outcome_metric(false), "RestoreTestFailure");
        assert_eq!(integrity_metric(true), "DataIntegritySuccess");
        assert_eq!(integrity_metric(false), "DataIntegrityFailure");
    }
}
