//! Command handlers
//!
//! Each handler module contains the execution logic for one CLI command
//! plus the pure helpers it is built from.

pub mod instrument;
pub mod run;
pub mod scan;
pub mod values;

pub use instrument::execute_instrument;
pub use run::{check_threshold, execute_run, render_report};
pub use scan::{execute_scan, render_scan};
pub use values::expand_values;
