//! Chartcov: Conditional-Branch Coverage for Template Charts
//!
//! Measures which `if`/`else`/`with`/`range` arms of a chart's templates
//! are exercised by a set of values inputs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    CHARTCOV Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Chart      │    │ Instrument │    │ Renderer   │            │
//! │   │ (source)   │───►│ (scratch   │───►│ (one run   │            │
//! │   │            │    │  copy)     │    │  per input)│            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                     ┌────────────┐    ┌────────────┐            │
//! │                     │ Report     │◄───│ Trace      │            │
//! │                     │ text/json/ │    │ Parser     │            │
//! │                     │ cobertura  │    │            │            │
//! │                     └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chartcov::{Chart, CoverageConfig, CoverageEngine, HelmRenderer, ValuesInput};
//!
//! # fn main() -> chartcov::ChartcovResult<()> {
//! let chart = Chart::load("charts/app")?;
//! let engine = CoverageEngine::new(chart, CoverageConfig::default(), HelmRenderer::new())?;
//! let report = engine.run(&[ValuesInput::file("charts/app/values.yaml")])?;
//! println!("{:?}", report.coverage_percent());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chart;
pub mod coverage;
mod engine;
mod renderer;
mod result;
mod workspace;

pub use chart::{
    filters_match, path_matches, Chart, ChartManifest, FileKind, TemplateFile, MANIFEST_FILE,
    TEMPLATES_DIR,
};
pub use coverage::{
    AddressMode, Branch, BranchId, BranchIndex, CoberturaFormatter, CoverageConfig,
    CoverageReport, CoverageStatus, CoverageSummary, ExecutedTrace, JsonFormatter, ReportFormat,
    RunCoverage, ScanNote, TextFormatter, TraceParser,
};
pub use engine::{CoverageEngine, Discovery, RunEvent, ValuesInput, NO_VALUES_LABEL};
pub use renderer::{FnRenderer, HelmRenderer, RenderOutput, RenderRequest, Renderer};
pub use result::{ChartcovError, ChartcovResult};
pub use workspace::Workspace;
