//! Coverage Collector
//!
//! Manages a coverage session over a fixed set of discovered branches and
//! the runs recorded against it.

use super::branch::{BranchId, BranchIndex};
use super::instrument::DEFAULT_WRAPPER_KEYS;
use super::report::{CoverageReport, RunCoverage};
use super::token::DEFAULT_DYNAMIC_FUNCTIONS;
use super::trace::ExecutedTrace;
use std::collections::BTreeSet;

/// Coverage collection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageConfig {
    /// Template path filters; empty instruments every template file
    pub filters: Vec<String>,
    /// Extra arguments passed through to the renderer
    pub extra_args: Vec<String>,
    /// Keys under which define contexts may wrap the root context
    pub wrapper_keys: Vec<String>,
    /// Functions whose string arguments are evaluated as template source
    pub dynamic_functions: Vec<String>,
}

impl CoverageConfig {
    /// Create a builder for coverage config
    #[must_use]
    pub fn builder() -> CoverageConfigBuilder {
        CoverageConfigBuilder::default()
    }
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for coverage configuration
#[derive(Debug, Default)]
pub struct CoverageConfigBuilder {
    filters: Vec<String>,
    extra_args: Vec<String>,
    wrapper_keys: Option<Vec<String>>,
    dynamic_functions: Option<Vec<String>>,
}

impl CoverageConfigBuilder {
    /// Add a template path filter
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Replace all template path filters
    #[must_use]
    pub fn filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Set extra renderer arguments
    #[must_use]
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Set the wrapper context keys
    #[must_use]
    pub fn wrapper_keys(mut self, keys: Vec<String>) -> Self {
        self.wrapper_keys = Some(keys);
        self
    }

    /// Set the dynamic-evaluation function names
    #[must_use]
    pub fn dynamic_functions(mut self, names: Vec<String>) -> Self {
        self.dynamic_functions = Some(names);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> CoverageConfig {
        CoverageConfig {
            filters: self.filters,
            extra_args: self.extra_args,
            wrapper_keys: self
                .wrapper_keys
                .unwrap_or_else(|| to_owned(DEFAULT_WRAPPER_KEYS)),
            dynamic_functions: self
                .dynamic_functions
                .unwrap_or_else(|| to_owned(DEFAULT_DYNAMIC_FUNCTIONS)),
        }
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Collects per-run coverage against a discovered branch set
#[derive(Debug)]
pub struct CoverageCollector {
    /// Discovered branches, fixed for the collector's lifetime
    discovered: BranchIndex,
    /// Current session report
    report: Option<CoverageReport>,
    /// Current run
    current_run: Option<RunCoverage>,
}

impl CoverageCollector {
    /// Create a collector for a discovered branch set
    #[must_use]
    pub fn new(discovered: BranchIndex) -> Self {
        Self {
            discovered,
            report: None,
            current_run: None,
        }
    }

    /// Begin a coverage session for the named chart
    pub fn begin_session(&mut self, chart: &str) {
        self.report = Some(CoverageReport::new(chart, self.discovered.clone()));
        self.current_run = None;
    }

    /// Begin a run within the session
    pub fn begin_run(&mut self, label: &str) {
        self.current_run = Some(RunCoverage::new(label));
    }

    /// Record an executed trace against the current run
    ///
    /// IDs that were never discovered are ignored with a warning. Returns
    /// the number of newly covered branches in this run.
    pub fn record_trace(&mut self, trace: &ExecutedTrace) -> usize {
        let Some(run) = &mut self.current_run else {
            tracing::warn!("trace recorded outside a run, ignored");
            return 0;
        };
        let mut added = 0;
        for id in trace.all() {
            if !self.discovered.contains(id) {
                tracing::warn!(%id, "trace reports an unknown branch id");
                continue;
            }
            if run.covered.insert(id.clone()) {
                added += 1;
            }
        }
        added
    }

    /// End the current run and fold it into the session
    pub fn end_run(&mut self) {
        let Some(run) = self.current_run.take() else {
            return;
        };
        tracing::info!(run = %run.label, covered = run.covered.len(), "run complete");
        if let Some(report) = &mut self.report {
            report.add_run(run);
        }
    }

    /// End the current session and return the report
    #[must_use]
    pub fn end_session(&mut self) -> CoverageReport {
        self.end_run();
        self.report
            .take()
            .unwrap_or_else(|| CoverageReport::new("", self.discovered.clone()))
    }

    /// Discard every recorded run
    pub fn abort_session(&mut self) {
        self.current_run = None;
        self.report = None;
    }

    /// Branch IDs covered so far in the current run
    #[must_use]
    pub fn current_covered(&self) -> BTreeSet<BranchId> {
        self.current_run
            .as_ref()
            .map(|r| r.covered.clone())
            .unwrap_or_default()
    }

    /// Check if a session is active
    #[must_use]
    pub fn is_session_active(&self) -> bool {
        self.report.is_some()
    }

    /// Check if a run is active
    #[must_use]
    pub fn is_run_active(&self) -> bool {
        self.current_run.is_some()
    }

    /// Get the discovered branches
    #[must_use]
    pub fn discovered(&self) -> &BranchIndex {
        &self.discovered
    }
}
