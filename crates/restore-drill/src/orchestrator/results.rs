//! Results writing and summary display
//!
//! The response envelope goes to stdout so callers can parse it; the human
//! summary goes to stderr.

use super::cleanup::StepResult;
use super::sweep::SweepReport;
use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use restore_drill_common::{RunResponse, TestRunResult};
use std::path::Path;
use tracing::info;

/// Write the result record as pretty JSON.
pub fn write_results(path: &Path, result: &TestRunResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    info!(path = %path.display(), "Results written");
    Ok(())
}

/// Print the `{"statusCode", "body"}` envelope to stdout.
pub fn print_response(result: &TestRunResult) -> Result<()> {
    let response = RunResponse::from_result(result).context("Failed to serialize response")?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

fn yes_no(value: bool) -> Cell {
    if value {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::Red)
    }
}

/// Summary table for one drill
pub fn summary_table(result: &TestRunResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Stage"), Cell::new("Result")]);

    let na = || "-".to_string();
    table.add_row(vec![Cell::new("Success"), yes_no(result.success)]);
    table.add_row(vec![
        Cell::new("Snapshot"),
        Cell::new(result.snapshot_id.clone().unwrap_or_else(na)),
    ]);
    table.add_row(vec![
        Cell::new("Test cluster"),
        Cell::new(result.test_cluster_id.clone().unwrap_or_else(na)),
    ]);
    table.add_row(vec![
        Cell::new("Restore (min)"),
        Cell::new(result.restore_duration_minutes),
    ]);
    table.add_row(vec![
        Cell::new("Connectivity"),
        yes_no(result.connectivity_test_passed),
    ]);
    for test in &result.data_integrity_tests {
        table.add_row(vec![
            Cell::new(&test.name),
            Cell::new(format!("{} ({})", test.label(), test.value)),
        ]);
    }
    table.add_row(vec![Cell::new("Cleanup"), yes_no(result.cleanup_completed)]);
    if let Some(error) = &result.error_message {
        table.add_row(vec![Cell::new("Error"), Cell::new(error).fg(Color::Red)]);
    }

    table
}

/// Print the drill summary table to stderr
pub fn print_summary(result: &TestRunResult) {
    eprintln!("\n=== Backup Restore Test ===\n");
    eprintln!("{}", summary_table(result));
}

fn step_label(step: &StepResult) -> String {
    match step {
        StepResult::Deleted => "deleted".to_string(),
        StepResult::AlreadyAbsent => "already gone".to_string(),
        StepResult::Failed(e) => format!("failed: {e}"),
    }
}

/// Print a sweep report to stderr
pub fn print_sweep_report(report: &SweepReport, dry_run: bool) {
    eprintln!();
    if dry_run {
        eprintln!("=== Orphaned Test Clusters (dry run) ===");
    } else {
        eprintln!("=== Orphaned Test Cluster Cleanup ===");
    }

    eprintln!(
        "Scanned {} clusters, {} orphaned, {} skipped",
        report.scanned,
        report.orphaned.len(),
        report.skipped
    );

    if report.orphaned.is_empty() {
        eprintln!("No orphaned test clusters found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Cluster"),
            Cell::new("Status"),
            Cell::new("Created"),
            Cell::new("Cleanup"),
        ]);

    for orphan in &report.orphaned {
        let cleanup = report
            .outcomes
            .iter()
            .find(|o| o.cluster_id == orphan.cluster_id)
            .map(|o| step_label(&o.cluster))
            .unwrap_or_else(|| "would delete".to_string());
        table.add_row(vec![
            Cell::new(&orphan.cluster_id),
            Cell::new(&orphan.status),
            Cell::new(orphan.created_at.format("%Y-%m-%d %H:%M UTC")),
            Cell::new(cleanup),
        ]);
    }
    eprintln!("{table}");

    if dry_run {
        eprintln!("Run with --execute to delete these clusters.");
    } else {
        eprintln!("Deleted: {}, Failed: {}", report.deleted, report.failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restore_drill_common::IntegrityTestRecord;

    fn result() -> TestRunResult {
        TestRunResult {
            success: true,
            snapshot_id: Some("snap-1".into()),
            test_cluster_id: Some("c".into()),
            data_integrity_tests: vec![IntegrityTestRecord::evaluated(
                "storage_encrypted",
                "Storage encryption is enabled",
                true,
                "true",
            )],
            cleanup_completed: true,
            ..Default::default()
        }
    }

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");

        write_results(&path, &result()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"success\": true"));
        let parsed: TestRunResult = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, result());
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("result.json");
        let err = write_results(&path, &result()).unwrap_err();
        assert!(err.to_string().contains("Failed to write results"));
    }

    #[test]
    fn summary_lists_integrity_tests() {
        let rendered = summary_table(&result()).to_string();
        assert!(rendered.contains("storage_encrypted"));
        assert!(rendered.contains("PASS (true)"));
        assert!(!rendered.contains("Error"));
    }
}
