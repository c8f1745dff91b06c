//! Coverage Engine
//!
//! Orchestrates one invocation: stage the chart, instrument the selected
//! files, render once per values input, and fold the traces into a report.
//! Runs are strictly sequential; the instrumented chart carries a single
//! trace state per render. Any failed render aborts the whole computation
//! and discards the runs already completed.

use crate::chart::Chart;
use crate::coverage::{
    Branch, BranchIndex, BlockScanner, CoverageCollector, CoverageConfig, CoverageReport,
    Injector, MarkerAllocator, ScanNote, TraceParser,
};
use crate::renderer::{RenderRequest, Renderer};
use crate::result::{ChartcovError, ChartcovResult};
use crate::workspace::{copy_tree, write_relative, Workspace};
use std::path::{Path, PathBuf};

/// Label used for a run without a values document
pub const NO_VALUES_LABEL: &str = "<none>";

/// One values input, rendered as one run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValuesInput {
    path: Option<PathBuf>,
}

impl ValuesInput {
    /// Render with the chart's own defaults only
    #[must_use]
    pub fn none() -> Self {
        Self { path: None }
    }

    /// Render with a values document
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Values document, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run label
    #[must_use]
    pub fn label(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| NO_VALUES_LABEL.to_string(), |p| p.display().to_string())
    }
}

/// Result of static discovery
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Every discovered branch
    pub branches: BranchIndex,
    /// Scanner tolerance notes
    pub notes: Vec<ScanNote>,
    /// Files that were scanned
    pub files: Vec<String>,
}

/// Progress notifications emitted by [`CoverageEngine::run_with_progress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Chart instrumented, renders about to start
    Instrumented {
        /// Discovered branches
        branches: usize,
        /// Number of runs that will execute
        runs: usize,
        /// Scanner tolerance notes for the instrumented files
        notes: Vec<ScanNote>,
    },
    /// A render is starting
    RunStarted {
        /// 0-based run index
        index: usize,
        /// Run label
        label: String,
    },
    /// A render completed and its trace was recorded
    RunFinished {
        /// 0-based run index
        index: usize,
        /// Run label
        label: String,
        /// Branches covered by this run
        covered: usize,
    },
}

/// Drives discovery, instrumentation and rendering for one chart
#[derive(Debug)]
pub struct CoverageEngine<R> {
    chart: Chart,
    config: CoverageConfig,
    renderer: R,
    scanner: BlockScanner,
    injector: Injector,
}

impl<R: Renderer> CoverageEngine<R> {
    /// Create an engine
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner patterns cannot be built from the
    /// configured dynamic-evaluation function names.
    pub fn new(chart: Chart, config: CoverageConfig, renderer: R) -> ChartcovResult<Self> {
        let scanner = BlockScanner::new(&config.dynamic_functions)?;
        let injector = Injector::new(config.wrapper_keys.clone());
        Ok(Self {
            chart,
            config,
            renderer,
            scanner,
            injector,
        })
    }

    /// Chart under test
    #[must_use]
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// Discover branches without writing anything
    ///
    /// # Errors
    ///
    /// Returns an error if a selected file cannot be read.
    pub fn discover(&self) -> ChartcovResult<Discovery> {
        self.process(|_, _| Ok(()))
    }

    /// Write an instrumented copy of the chart to `dest`
    ///
    /// # Errors
    ///
    /// Returns an error if the chart cannot be copied or a file cannot be
    /// read or written.
    pub fn instrument_into(&self, dest: &Path) -> ChartcovResult<Discovery> {
        copy_tree(self.chart.root(), dest)?;
        self.process(|relative, text| write_relative(dest, relative, text))
    }

    /// Render every input and collect cumulative coverage
    ///
    /// An empty `inputs` slice renders once without values.
    ///
    /// # Errors
    ///
    /// Returns [`ChartcovError::RenderFailed`] on the first failed render,
    /// discarding earlier runs. Staging, renderer and trace errors are
    /// returned as they occur.
    pub fn run(&self, inputs: &[ValuesInput]) -> ChartcovResult<CoverageReport> {
        self.run_with_progress(inputs, |_| {})
    }

    /// [`run`](Self::run) with progress notifications
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_progress(
        &self,
        inputs: &[ValuesInput],
        mut progress: impl FnMut(RunEvent),
    ) -> ChartcovResult<CoverageReport> {
        let default_input = [ValuesInput::none()];
        let inputs = if inputs.is_empty() {
            &default_input[..]
        } else {
            inputs
        };

        let workspace = Workspace::stage(&self.chart)?;
        let discovery = self.process(|relative, text| workspace.write_file(relative, text))?;
        progress(RunEvent::Instrumented {
            branches: discovery.branches.len(),
            runs: inputs.len(),
            notes: discovery.notes.clone(),
        });

        let mut collector = CoverageCollector::new(discovery.branches);
        collector.begin_session(self.chart.name());

        for (index, input) in inputs.iter().enumerate() {
            let label = input.label();
            progress(RunEvent::RunStarted {
                index,
                label: label.clone(),
            });
            tracing::info!(run = %label, "rendering");

            collector.begin_run(&label);
            let request = RenderRequest {
                chart_dir: workspace.chart_dir(),
                values: input.path(),
                extra_args: &self.config.extra_args,
            };
            let output = match self.renderer.render(&request) {
                Ok(output) => output,
                Err(e) => {
                    collector.abort_session();
                    return Err(e);
                }
            };
            if !output.is_success() {
                collector.abort_session();
                return Err(ChartcovError::RenderFailed {
                    input: label,
                    status: output.status(),
                    diagnostic: output.diagnostic().to_string(),
                });
            }

            let trace = match TraceParser::parse(&output.stdout) {
                Ok(trace) => trace,
                Err(e) => {
                    collector.abort_session();
                    return Err(e);
                }
            };
            let covered = collector.record_trace(&trace);
            collector.end_run();
            progress(RunEvent::RunFinished {
                index,
                label,
                covered,
            });
        }

        Ok(collector.end_session())
    }

    /// Scan, allocate and instrument every selected file, handing each
    /// instrumented text to `sink`
    fn process(
        &self,
        mut sink: impl FnMut(&str, &str) -> ChartcovResult<()>,
    ) -> ChartcovResult<Discovery> {
        let mut allocator = MarkerAllocator::new();
        let mut discovery = Discovery::default();

        for file in self.chart.selected_files(&self.config.filters) {
            let source = std::fs::read_to_string(&file.path)?;
            let outcome = self.scanner.scan(&file.relative_path, &source);

            let branches =
                allocator.allocate(&file.relative_path, file.kind, outcome.descriptors);
            let refs: Vec<&Branch> = branches.iter().collect();
            let instrumented = self.injector.instrument(&source, file.kind, &refs);
            sink(&file.relative_path, &instrumented)?;

            tracing::debug!(file = %file.relative_path, branches = branches.len(), "instrumented");
            discovery.notes.extend(outcome.notes);
            discovery.files.push(file.relative_path.clone());
            discovery.branches.extend(branches);
        }

        tracing::info!(
            branches = discovery.branches.len(),
            files = discovery.files.len(),
            "discovery complete"
        );
        Ok(discovery)
    }
}
