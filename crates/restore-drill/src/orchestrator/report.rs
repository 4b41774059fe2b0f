//! Reporting Sink
//!
//! Builds the metric batch and notification for a finished drill and hands
//! them to a [`ReportingSink`]. Each is delivered exactly once per run;
//! delivery failures are logged and never change the drill's outcome.

use crate::aws::cloudwatch::MetricSample;
use crate::aws::{AwsContext, CloudWatchMetrics, FromAwsContext, SnsNotifier};
use crate::config::{IdentityConfig, ReportingConfig};
use anyhow::Result;
use chrono::{DateTime, Utc};
use restore_drill_common::TestRunResult;
use restore_drill_common::defaults::MAX_SUBJECT_LEN;
use restore_drill_common::metrics::{dimensions, integrity_metric, names, outcome_metric};
use std::fmt::Write;
use tracing::{error, info};

/// Metrics for one drill, published together
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBatch {
    pub namespace: String,
    pub dimensions: Vec<(String, String)>,
    pub samples: Vec<MetricSample>,
}

/// A plain-text notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub message: String,
    pub attributes: Vec<(String, String)>,
}

/// Destination for drill metrics and notifications.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait ReportingSink {
    async fn publish_metrics(&self, batch: &MetricBatch) -> Result<()>;

    async fn send_notification(&self, notification: &Notification) -> Result<()>;
}

/// CloudWatch + SNS sink
pub struct AwsReportingSink {
    metrics: CloudWatchMetrics,
    notifier: SnsNotifier,
    topic_arn: Option<String>,
}

impl AwsReportingSink {
    pub fn new(ctx: &AwsContext, reporting: &ReportingConfig) -> Self {
        Self {
            metrics: CloudWatchMetrics::from_context(ctx),
            notifier: SnsNotifier::from_context(ctx),
            topic_arn: reporting.sns_topic_arn.clone(),
        }
    }
}

impl ReportingSink for AwsReportingSink {
    async fn publish_metrics(&self, batch: &MetricBatch) -> Result<()> {
        let dimensions: Vec<(&str, &str)> = batch
            .dimensions
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.metrics
            .put_metrics(&batch.namespace, &dimensions, &batch.samples)
            .await
    }

    async fn send_notification(&self, notification: &Notification) -> Result<()> {
        let Some(topic_arn) = &self.topic_arn else {
            info!("No SNS topic configured, skipping notification");
            return Ok(());
        };
        self.notifier
            .publish(
                topic_arn,
                &notification.subject,
                &notification.message,
                &notification.attributes,
            )
            .await
    }
}

/// Publish metrics and notification for a finished drill.
pub async fn report_run<S: ReportingSink>(
    sink: &S,
    identity: &IdentityConfig,
    reporting: &ReportingConfig,
    result: &TestRunResult,
) {
    let batch = build_metric_batch(identity, &reporting.metrics_namespace, result);
    match sink.publish_metrics(&batch).await {
        Ok(()) => info!(namespace = %batch.namespace, "Metrics published"),
        Err(e) => error!(error = ?e, "Error publishing metrics"),
    }

    let notification = build_notification(identity, result, Utc::now());
    match sink.send_notification(&notification).await {
        Ok(()) => info!(subject = %notification.subject, "Notification handled"),
        Err(e) => error!(error = ?e, "Error sending notification"),
    }
}

/// The fixed metric set for a result.
pub fn build_metric_batch(
    identity: &IdentityConfig,
    namespace: &str,
    result: &TestRunResult,
) -> MetricBatch {
    MetricBatch {
        namespace: namespace.to_string(),
        dimensions: vec![
            (dimensions::PROJECT.into(), identity.project.clone()),
            (dimensions::ENVIRONMENT.into(), identity.environment.clone()),
            (dimensions::REGION.into(), identity.region_name.clone()),
        ],
        samples: vec![
            MetricSample::count(names::EXECUTED),
            MetricSample::count(outcome_metric(result.success)),
            MetricSample::new(
                names::RESTORE_MINUTES,
                result.restore_duration_minutes as f64,
            ),
            MetricSample::count(integrity_metric(result.integrity_passed())),
        ],
    }
}

fn status_word(success: bool) -> &'static str {
    if success { "SUCCESS" } else { "FAILURE" }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// Render the notification for a result.
pub fn build_notification(
    identity: &IdentityConfig,
    result: &TestRunResult,
    now: DateTime<Utc>,
) -> Notification {
    let status = status_word(result.success);

    let mut message = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(message, "Backup Restoration Test {status}");
    let _ = writeln!(message);
    let _ = writeln!(message, "Project: {}", identity.project);
    let _ = writeln!(message, "Environment: {}", identity.environment);
    let _ = writeln!(message, "Region: {}", identity.region_name);
    let _ = writeln!(message, "Test Time: {}", now.to_rfc3339());
    let _ = writeln!(message);
    let _ = writeln!(message, "=== Test Details ===");
    let _ = writeln!(message, "Snapshot ID: {}", or_na(result.snapshot_id.as_deref()));
    let _ = writeln!(
        message,
        "Snapshot Created: {}",
        or_na(result.snapshot_create_time.map(|t| t.to_rfc3339()))
    );
    let _ = writeln!(message, "Test Cluster: {}", or_na(result.test_cluster_id.as_deref()));
    let _ = writeln!(
        message,
        "Restoration Duration: {} minutes",
        result.restore_duration_minutes
    );
    let _ = writeln!(
        message,
        "Connectivity Test: {}",
        if result.connectivity_test_passed { "PASSED" } else { "FAILED" }
    );
    let _ = writeln!(
        message,
        "Cleanup Completed: {}",
        if result.cleanup_completed { "YES" } else { "NO" }
    );

    if let Some(error) = &result.error_message {
        let _ = writeln!(message);
        let _ = writeln!(message, "=== Error Details ===");
        let _ = writeln!(message, "{error}");
    }

    if !result.data_integrity_tests.is_empty() {
        let _ = writeln!(message);
        let _ = writeln!(message, "=== Data Integrity Tests ===");
        for test in &result.data_integrity_tests {
            let _ = writeln!(message, "  [{}] {}", test.label(), test.description);
        }
    }

    let subject = format!(
        "[{}] Backup Restore Test {status} - {}/{}",
        identity.project, identity.environment, identity.region_name
    );

    Notification {
        subject: subject.chars().take(MAX_SUBJECT_LEN).collect(),
        message,
        attributes: vec![
            ("status".into(), status.into()),
            ("project".into(), identity.project.clone()),
            ("environment".into(), identity.environment.clone()),
        ],
    }
}
