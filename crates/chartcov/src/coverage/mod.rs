//! Conditional-Branch Coverage for Template Charts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  CHARTCOV COVERAGE PIPELINE                                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  source → BlockScanner → MarkerAllocator → Injector             │
//! │                                               ↓                 │
//! │                             instrumented chart (per values run) │
//! │                                               ↓                 │
//! │  Report ← CoverageCollector ← TraceParser ← Renderer            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discovery is static: the branch set is fixed before any render. Each
//! run contributes the subset of branches its rendered sentinels report;
//! cumulative coverage is the union over runs.

mod branch;
mod collector;
pub mod formatters;
mod instrument;
mod report;
mod scanner;
mod token;
mod trace;

pub use branch::{
    AddressMode, Branch, BranchDescriptor, BranchId, BranchIndex, MarkerAllocator, Trigger,
};
pub use collector::{CoverageCollector, CoverageConfig, CoverageConfigBuilder};
pub use formatters::{CoberturaFormatter, JsonFormatter, ReportFormat, TextFormatter};
pub use instrument::{Injector, DEFAULT_WRAPPER_KEYS, SENTINEL_PREFIX, STATE_KEY};
pub use report::{CoverageReport, CoverageStatus, CoverageSummary, RunCoverage};
pub use scanner::{BlockScanner, ScanNote, ScanOutcome};
pub use token::{ControlToken, Placement, TokenKind, Tokenizer, DEFAULT_DYNAMIC_FUNCTIONS};
pub use trace::{ExecutedTrace, TraceParser};

#[cfg(test)]
mod tests;
