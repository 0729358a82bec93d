//! Run summary: which columns were compared, which failed, and where the charts went.

use crate::compare::RowRange;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// File name of the summary written next to the charts.
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedColumn {
    pub column: String,
    /// `None` when rendering was skipped for an identical column.
    pub chart: Option<String>,
    pub max_abs_difference: Option<f64>,
    pub identical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedColumn {
    pub column: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub baseline: String,
    pub modified: String,
    pub row_count: usize,
    pub row_range: RowRange,
    pub compared: Vec<ComparedColumn>,
    pub failed: Vec<FailedColumn>,
}

impl RunReport {
    pub fn succeeded_count(&self) -> usize {
        self.compared.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Columns whose values differ somewhere in the compared window.
    pub fn changed(&self) -> impl Iterator<Item = &ComparedColumn> {
        self.compared.iter().filter(|c| !c.identical)
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// End-of-run listing: successes count, then every failure.
    pub fn log_summary(&self) {
        log::info!(
            "Processed {} column(s) successfully ({} changed, {} identical)",
            self.succeeded_count(),
            self.changed().count(),
            self.succeeded_count() - self.changed().count()
        );
        if self.failed.is_empty() {
            return;
        }
        log::warn!("{} column(s) failed:", self.failed_count());
        for failure in &self.failed {
            log::warn!("  Failed on: {} ({})", failure.column, failure.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        RunReport {
            baseline: "base.csv".into(),
            modified: "mod.csv".into(),
            row_count: 3,
            row_range: RowRange::new(Some(1), None),
            compared: vec![
                ComparedColumn {
                    column: "A".into(),
                    chart: Some("plots/A.png".into()),
                    max_abs_difference: Some(0.5),
                    identical: false,
                },
                ComparedColumn {
                    column: "B".into(),
                    chart: None,
                    max_abs_difference: Some(0.0),
                    identical: true,
                },
            ],
            failed: vec![FailedColumn {
                column: "X".into(),
                reason: "not numeric".into(),
            }],
        }
    }

    #[test]
    fn counts() {
        let report = sample();
        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.changed().map(|c| c.column.as_str()).collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn json_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let report = sample();
        report.write_json(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"max_abs_difference\": 0.5"));
        let parsed: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
    }
}
