//! Test run result record
//!
//! `TestRunResult` is created when a drill starts, filled in by each stage as it
//! completes and serialized once at the end. It never outlives the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one integrity assertion against the restored cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityTestRecord {
    /// Stable machine name (e.g. `storage_encrypted`)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// `Some(true|false)` once evaluated, `None` while pending
    pub passed: Option<bool>,
    /// Observed value, rendered as text
    pub value: String,
    /// Source query for data-plane checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl IntegrityTestRecord {
    /// An evaluated check.
    pub fn evaluated(
        name: impl Into<String>,
        description: impl Into<String>,
        passed: bool,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            passed: Some(passed),
            value: value.into(),
            query: None,
        }
    }

    /// A check recorded but left for data-plane tooling to evaluate.
    pub fn pending(
        name: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            passed: None,
            value: value.into(),
            query: Some(query.into()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.passed.is_none()
    }

    /// Short label used in summaries and notifications
    pub fn label(&self) -> &'static str {
        match self.passed {
            Some(true) => "PASS",
            Some(false) => "FAIL",
            None => "PENDING",
        }
    }
}

/// Aggregate record of one restore drill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRunResult {
    pub success: bool,
    pub snapshot_id: Option<String>,
    pub snapshot_create_time: Option<DateTime<Utc>>,
    pub restore_start_time: Option<DateTime<Utc>>,
    pub restore_end_time: Option<DateTime<Utc>>,
    /// Whole minutes between restore start and end, truncated
    pub restore_duration_minutes: u64,
    pub connectivity_test_passed: bool,
    pub data_integrity_tests: Vec<IntegrityTestRecord>,
    pub cleanup_completed: bool,
    /// First fatal failure encountered
    pub error_message: Option<String>,
    /// Set as soon as cluster creation is attempted
    pub test_cluster_id: Option<String>,
}

impl TestRunResult {
    /// Record the end of the restore and derive the duration from it.
    pub fn finish_restore(&mut self, end: DateTime<Utc>) {
        self.restore_end_time = Some(end);
        self.restore_duration_minutes = self
            .restore_start_time
            .map(|start| (end - start).num_minutes().max(0) as u64)
            .unwrap_or(0);
    }

    /// Whether every evaluated integrity check passed.
    ///
    /// Pending checks are ignored; an empty battery counts as passing.
    pub fn integrity_passed(&self) -> bool {
        self.data_integrity_tests
            .iter()
            .filter_map(|t| t.passed)
            .all(|passed| passed)
    }

    /// HTTP-style status code for this result
    pub fn status_code(&self) -> u16 {
        if self.success { 200 } else { 500 }
    }
}

/// Response envelope returned to the trigger: `{"statusCode": .., "body": ".."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub status_code: u16,
    /// The result record serialized as a JSON string
    pub body: String,
}

impl RunResponse {
    pub fn from_result(result: &TestRunResult) -> serde_json::Result<Self> {
        Ok(Self {
            status_code: result.status_code(),
            body: serde_json::to_string(result)?,
        })
    }
}
