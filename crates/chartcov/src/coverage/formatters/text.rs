//! Plain Text Report Formatter
//!
//! ```text
//! Chart: app
//! Total branches:    4
//! Covered branches:  3
//!   file branches:   2/3
//!   helper branches: 1/1
//! Coverage: 75% (partial)
//!
//! Covered file branches:
//!   templates/cm.yaml:L5
//! ```
//!
//! The percentage is truncated to an integer. A chart with no branches
//! prints `No branches found` instead of a percentage.

use crate::chart::FileKind;
use crate::coverage::{CoverageReport, CoverageStatus};
use crate::result::ChartcovResult;
use std::fmt::Write;
use std::path::Path;

/// Plain text report generator
#[derive(Debug)]
pub struct TextFormatter<'a> {
    report: &'a CoverageReport,
    show_uncovered: bool,
    show_runs: bool,
}

impl<'a> TextFormatter<'a> {
    /// Create a new text formatter
    #[must_use]
    pub fn new(report: &'a CoverageReport) -> Self {
        Self {
            report,
            show_uncovered: false,
            show_runs: false,
        }
    }

    /// Also list branches no run covered
    #[must_use]
    pub fn with_uncovered(mut self, enabled: bool) -> Self {
        self.show_uncovered = enabled;
        self
    }

    /// Also list the covered count of every run
    #[must_use]
    pub fn with_runs(mut self, enabled: bool) -> Self {
        self.show_runs = enabled;
        self
    }

    /// Generate the report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        let summary = self.report.summary();
        let mut out = String::new();

        let _ = writeln!(out, "Chart: {}", self.report.chart());
        let Some(percent) = summary.coverage_percent else {
            out.push_str("No branches found\n");
            return out;
        };

        let _ = writeln!(out, "Total branches:    {}", summary.total_branches);
        let _ = writeln!(out, "Covered branches:  {}", summary.covered_branches);
        let _ = writeln!(
            out,
            "  file branches:   {}/{}",
            summary.file_branches_covered, summary.file_branches_total
        );
        let _ = writeln!(
            out,
            "  helper branches: {}/{}",
            summary.helper_branches_covered, summary.helper_branches_total
        );
        let _ = writeln!(
            out,
            "Coverage: {}% ({})",
            truncated_percent(percent),
            status_label(CoverageStatus::from_percent(percent))
        );

        for (kind, title) in [
            (FileKind::Template, "Covered file branches"),
            (FileKind::Helper, "Covered helper branches"),
        ] {
            let ids = self.report.covered_of_kind(kind);
            let _ = writeln!(out, "\n{title}:");
            if ids.is_empty() {
                out.push_str("  (none)\n");
            }
            for id in ids {
                let _ = writeln!(out, "  {id}");
            }
        }

        if self.show_uncovered {
            let uncovered = self.report.uncovered();
            let _ = writeln!(out, "\nUncovered branches ({}):", uncovered.len());
            for branch in uncovered {
                let _ = writeln!(out, "  {}", branch.id);
            }
        }

        if self.show_runs && !self.report.runs().is_empty() {
            out.push_str("\nRuns:\n");
            for run in self.report.runs() {
                let _ = writeln!(out, "  {}: {} covered", run.label, run.covered.len());
            }
        }

        out
    }

    /// Save the text report to a file
    ///
    /// # Errors
    ///
    /// Returns error if file write fails
    pub fn save(&self, path: &Path) -> ChartcovResult<()> {
        std::fs::write(path, self.generate())?;
        Ok(())
    }
}

/// Integer percentage, truncated toward zero
#[must_use]
pub fn truncated_percent(percent: f64) -> u32 {
    percent.clamp(0.0, 100.0).trunc() as u32
}

const fn status_label(status: CoverageStatus) -> &'static str {
    match status {
        CoverageStatus::Full => "complete",
        CoverageStatus::Partial => "partial",
        CoverageStatus::Low => "low",
    }
}
