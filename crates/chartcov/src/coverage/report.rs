//! Coverage Report
//!
//! Aggregate over one session: the discovered branch set, every run's
//! covered set and their union. Derived views:
//!
//! - `uncovered = discovered \ covered`
//! - `coverage_percent = |covered| * 100 / |discovered|`, absent when
//!   nothing was discovered
//! - per-kind totals for template files and helper files

use super::branch::{Branch, BranchId, BranchIndex};
use crate::chart::FileKind;
use serde::Serialize;
use std::collections::BTreeSet;

/// Branches covered by one renderer execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCoverage {
    /// Values input label
    pub label: String,
    /// Covered IDs, always a subset of the discovered set
    pub covered: BTreeSet<BranchId>,
}

impl RunCoverage {
    /// Create an empty run
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            covered: BTreeSet::new(),
        }
    }
}

/// Coverage band shown next to the percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    /// Every branch covered
    Full,
    /// At least half covered
    Partial,
    /// Less than half covered
    Low,
}

impl CoverageStatus {
    /// Band for a percentage
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            Self::Full
        } else if percent >= 50.0 {
            Self::Partial
        } else {
            Self::Low
        }
    }
}

/// Coverage summary statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    /// Discovered branches
    pub total_branches: usize,
    /// Branches covered by at least one run
    pub covered_branches: usize,
    /// Coverage percentage; `None` when no branches were discovered
    pub coverage_percent: Option<f64>,
    /// Discovered branches in template files
    pub file_branches_total: usize,
    /// Covered branches in template files
    pub file_branches_covered: usize,
    /// Discovered branches in helper files
    pub helper_branches_total: usize,
    /// Covered branches in helper files
    pub helper_branches_covered: usize,
}

impl CoverageSummary {
    /// Band for the coverage percentage, if there is one
    #[must_use]
    pub fn status(&self) -> Option<CoverageStatus> {
        self.coverage_percent.map(CoverageStatus::from_percent)
    }

    /// Uncovered branch count
    #[must_use]
    pub fn uncovered_branches(&self) -> usize {
        self.total_branches - self.covered_branches
    }
}

/// Coverage report containing all coverage data for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    /// Chart name
    chart: String,
    /// Statically discovered branches
    discovered: BranchIndex,
    /// Runs in execution order
    runs: Vec<RunCoverage>,
    /// Union of every run's covered set
    covered: BTreeSet<BranchId>,
}

impl CoverageReport {
    /// Create a report with no runs
    #[must_use]
    pub fn new(chart: &str, discovered: BranchIndex) -> Self {
        Self {
            chart: chart.to_string(),
            discovered,
            runs: Vec::new(),
            covered: BTreeSet::new(),
        }
    }

    /// Add a run, folding its covered set into the union
    ///
    /// IDs outside the discovered set are dropped.
    pub fn add_run(&mut self, mut run: RunCoverage) {
        run.covered.retain(|id| self.discovered.contains(id));
        self.covered.extend(run.covered.iter().cloned());
        self.runs.push(run);
    }

    /// Union another report into this one
    ///
    /// Discovered sets are combined, runs are appended in order.
    pub fn merge(&mut self, other: &Self) {
        self.discovered.extend(other.discovered.iter().cloned());
        for run in &other.runs {
            self.add_run(run.clone());
        }
    }

    /// Chart name
    #[must_use]
    pub fn chart(&self) -> &str {
        &self.chart
    }

    /// Discovered branches
    #[must_use]
    pub fn discovered(&self) -> &BranchIndex {
        &self.discovered
    }

    /// Runs in execution order
    #[must_use]
    pub fn runs(&self) -> &[RunCoverage] {
        &self.runs
    }

    /// Cumulative covered IDs
    #[must_use]
    pub fn covered(&self) -> &BTreeSet<BranchId> {
        &self.covered
    }

    /// Check if a branch is covered by any run
    #[must_use]
    pub fn is_covered(&self, id: &BranchId) -> bool {
        self.covered.contains(id)
    }

    /// Covered IDs of one file kind
    #[must_use]
    pub fn covered_of_kind(&self, kind: FileKind) -> Vec<&BranchId> {
        self.covered
            .iter()
            .filter(|id| self.discovered.get(id).is_some_and(|b| b.kind == kind))
            .collect()
    }

    /// Branches no run covered, in ID order
    #[must_use]
    pub fn uncovered(&self) -> Vec<&Branch> {
        self.discovered
            .iter()
            .filter(|b| !self.covered.contains(&b.id))
            .collect()
    }

    /// Coverage percentage, `None` when no branches were discovered
    #[must_use]
    pub fn coverage_percent(&self) -> Option<f64> {
        if self.discovered.is_empty() {
            return None;
        }
        Some(self.covered.len() as f64 * 100.0 / self.discovered.len() as f64)
    }

    /// Get coverage summary
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary {
            total_branches: self.discovered.len(),
            covered_branches: self.covered.len(),
            coverage_percent: self.coverage_percent(),
            file_branches_total: self.discovered.count_kind(FileKind::Template),
            file_branches_covered: self.covered_of_kind(FileKind::Template).len(),
            helper_branches_total: self.discovered.count_kind(FileKind::Helper),
            helper_branches_covered: self.covered_of_kind(FileKind::Helper).len(),
        }
    }
}
