//! JSON Report Formatter
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "chart": "app",
//!   "timestamp": "2026-01-01T00:00:00+00:00",
//!   "summary": {
//!     "total_branches": 4,
//!     "covered_branches": 3,
//!     "coverage_percent": 75.0,
//!     "file_branches_covered": 2,
//!     "helper_branches_covered": 1
//!   },
//!   "covered": { "files": ["..."], "helpers": ["..."] }
//! }
//! ```
//!
//! `coverage_percent` keeps fractional precision and is `null` when the
//! chart has no branches.

use crate::chart::FileKind;
use crate::coverage::{BranchId, CoverageReport};
use crate::result::ChartcovResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    /// Tool version
    pub version: String,
    /// Chart name
    pub chart: String,
    /// RFC 3339 generation time
    pub timestamp: String,
    /// Totals
    pub summary: JsonSummary,
    /// Covered IDs by collection
    pub covered: JsonCovered,
}

/// Summary block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Discovered branches
    pub total_branches: usize,
    /// Cumulative covered branches
    pub covered_branches: usize,
    /// Percentage, `null` with no branches
    pub coverage_percent: Option<f64>,
    /// Covered template-file branches
    pub file_branches_covered: usize,
    /// Covered helper-file branches
    pub helper_branches_covered: usize,
}

/// Covered ID lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonCovered {
    /// Template-file branch IDs
    pub files: Vec<BranchId>,
    /// Helper-file branch IDs
    pub helpers: Vec<BranchId>,
}

/// JSON report generator
#[derive(Debug)]
pub struct JsonFormatter<'a> {
    report: &'a CoverageReport,
    timestamp: Option<String>,
}

impl<'a> JsonFormatter<'a> {
    /// Create a new JSON formatter
    #[must_use]
    pub fn new(report: &'a CoverageReport) -> Self {
        Self {
            report,
            timestamp: None,
        }
    }

    /// Use a fixed timestamp instead of the current time
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Build the serialisable document
    #[must_use]
    pub fn document(&self) -> JsonReport {
        let summary = self.report.summary();
        let ids = |kind| {
            self.report
                .covered_of_kind(kind)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        };
        JsonReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            chart: self.report.chart().to_string(),
            timestamp: self
                .timestamp
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            summary: JsonSummary {
                total_branches: summary.total_branches,
                covered_branches: summary.covered_branches,
                coverage_percent: summary.coverage_percent,
                file_branches_covered: summary.file_branches_covered,
                helper_branches_covered: summary.helper_branches_covered,
            },
            covered: JsonCovered {
                files: ids(FileKind::Template),
                helpers: ids(FileKind::Helper),
            },
        }
    }

    /// Generate pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn generate(&self) -> ChartcovResult<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Save the JSON report to a file
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails
    pub fn save(&self, path: &Path) -> ChartcovResult<()> {
        let mut content = self.generate()?;
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }
}
