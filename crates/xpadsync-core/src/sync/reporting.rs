//! Run summaries and status reports

use std::fmt::Write;

use super::RunReport;
use crate::orchestrator::StatusReport;

/// Sync operation reporter
pub struct SyncReporter;

impl SyncReporter {
    /// Generate a summary of a sync run
    #[must_use]
    pub fn generate_summary(report: &RunReport) -> String {
        let mut output = String::new();

        output.push_str("\n=== Sync Summary ===\n");
        let _ = writeln!(output, "Created:   {}", report.created);
        let _ = writeln!(output, "Updated:   {}", report.updated);
        let _ = writeln!(output, "Unchanged: {}", report.unchanged);
        let _ = writeln!(output, "Deleted:   {}", report.deleted);

        if report.skipped > 0 && !report.skip_reasons.is_empty() {
            let _ = write!(output, "Skipped:   {}", report.skipped);
            let mut reasons: Vec<_> = report.skip_reasons.iter().collect();
            reasons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (reason, count) in reasons {
                let _ = write!(output, " ({reason}: {count})");
            }
            let _ = writeln!(output);
        } else {
            let _ = writeln!(output, "Skipped:   {}", report.skipped);
        }

        if !report.errors.is_empty() {
            let _ = writeln!(output, "\nErrors ({}):", report.errors.len());
            for error in &report.errors {
                let _ = writeln!(output, "  - {error}");
            }
        }

        let _ = writeln!(output, "\nTotal operations: {}", report.total_operations());

        if report.is_success() {
            output.push_str("Status: ✓ Success\n");
        } else {
            output.push_str("Status: ✗ Completed with errors\n");
        }

        output
    }

    /// Render a status report
    #[must_use]
    pub fn generate_status(status: &StatusReport) -> String {
        let mut output = String::new();
        let found = |exists: bool| if exists { "✓ exists" } else { "✗ not found" };

        output.push_str("=== Xpad Sync Status ===\n");
        let _ = writeln!(
            output,
            "Source directory: {} ({})",
            status.source_dir.display(),
            found(status.source_exists)
        );
        let _ = writeln!(
            output,
            "Output directory: {} ({})",
            status.output_dir.display(),
            found(status.output_exists)
        );
        let _ = writeln!(output, "Journal:          {}", status.journal_path.display());

        if let Some(count) = status.source_files {
            let _ = writeln!(output, "\nSource notes:     {count}");
        } else {
            output.push('\n');
        }
        let _ = writeln!(output, "Tracked notes:    {}", status.tracked);
        let _ = writeln!(output, "  Live:           {}", status.live);
        let _ = writeln!(output, "  Deleted:        {}", status.deleted);

        if !status.missing_outputs.is_empty() {
            let _ = writeln!(
                output,
                "  Missing output: {} (run `sync` to repair)",
                status.missing_outputs.len()
            );
            for name in &status.missing_outputs {
                let _ = writeln!(output, "    - {name}");
            }
        }

        match status.last_synced_at {
            Some(at) => {
                let _ = writeln!(output, "Last sync:        {}", at.to_rfc3339());
            }
            None => output.push_str("Last sync:        never\n"),
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    #[test]
    fn test_summary() {
        let report = RunReport {
            created: 5,
            updated: 3,
            unchanged: 4,
            skipped: 2,
            ..RunReport::default()
        };

        let summary = SyncReporter::generate_summary(&report);

        assert!(summary.contains("Created:   5"));
        assert!(summary.contains("Updated:   3"));
        assert!(summary.contains("Unchanged: 4"));
        assert!(summary.contains("Skipped:   2"));
        assert!(summary.contains("Total operations: 8"));
        assert!(summary.contains("✓ Success"));
    }

    #[test]
    fn test_summary_with_errors_and_reasons() {
        let mut report = RunReport {
            created: 1,
            skipped: 3,
            ..RunReport::default()
        };
        report.skip_reasons.insert("empty note".to_string(), 2);
        report.skip_reasons.insert("too large".to_string(), 1);
        report.errors.push("/notes/a: permission denied".to_string());

        let summary = SyncReporter::generate_summary(&report);

        assert!(summary.contains("Skipped:   3 (empty note: 2) (too large: 1)"));
        assert!(summary.contains("Errors (1)"));
        assert!(summary.contains("permission denied"));
        assert!(summary.contains("✗ Completed with errors"));
    }

    #[test]
    fn test_status() {
        let status = StatusReport {
            source_dir: PathBuf::from("/notes"),
            source_exists: true,
            output_dir: PathBuf::from("/out"),
            output_exists: false,
            journal_path: PathBuf::from("/out/.xpad_sync_metadata.json"),
            source_files: Some(4),
            tracked: 3,
            live: 2,
            deleted: 1,
            missing_outputs: vec!["xpad_note_a.md".to_string()],
            last_synced_at: Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
        };

        let text = SyncReporter::generate_status(&status);

        assert!(text.contains("/notes (✓ exists)"));
        assert!(text.contains("/out (✗ not found)"));
        assert!(text.contains("Source notes:     4"));
        assert!(text.contains("Tracked notes:    3"));
        assert!(text.contains("Missing output: 1"));
        assert!(text.contains("2026-01-02T03:04:05+00:00"));
    }
}
