//! Chartcov CLI Library
//!
//! Command-line interface for chart branch coverage: clap definitions,
//! output styling, logging setup and one handler per subcommand.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, InstrumentArgs, ReportFormatArg, RunArgs, ScanArgs, ScanFormatArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::{default_filter, init_logging};
pub use output::{abort_line, note_line, summary_line, ProgressReporter};
