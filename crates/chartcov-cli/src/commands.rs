//! CLI command definitions using clap

use crate::config::ColorChoice;
use chartcov::{AddressMode, ReportFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chartcov: conditional-branch coverage for template charts
#[derive(Parser, Debug)]
#[command(name = "chartcov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Instrument, render once per values input, and report coverage
    Run(RunArgs),

    /// List every branch without rendering
    Scan(ScanArgs),

    /// Write the instrumented chart to a directory
    Instrument(InstrumentArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Chart directory
    pub chart: PathBuf,

    /// Values file or directory of values files (repeatable, one run each)
    #[arg(short = 'f', long = "values")]
    pub values: Vec<PathBuf>,

    /// Restrict instrumented template files (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: ReportFormatArg,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Renderer binary
    #[arg(long, default_value = "helm", env = "CHARTCOV_HELM")]
    pub helm: PathBuf,

    /// List uncovered branch IDs in the text report
    #[arg(long)]
    pub show_uncovered: bool,

    /// Fail when cumulative coverage is below this percentage
    #[arg(long)]
    pub fail_under: Option<f64>,

    /// Extra arguments passed to the renderer after `--`
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

/// Arguments for the scan command
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Chart directory
    pub chart: PathBuf,

    /// Restrict scanned template files (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Print range IDs (`L<start>-L<end>`) instead of point IDs
    #[arg(long)]
    pub ranges: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ScanFormatArg,
}

/// Arguments for the instrument command
#[derive(Parser, Debug)]
pub struct InstrumentArgs {
    /// Chart directory
    pub chart: PathBuf,

    /// Destination directory for the instrumented copy
    #[arg(short, long)]
    pub output: PathBuf,

    /// Restrict instrumented template files (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Write into a non-empty output directory
    #[arg(long)]
    pub force: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Detect from the terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Coverage report format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormatArg {
    /// Plain text summary
    #[default]
    Text,
    /// JSON document
    Json,
    /// Cobertura XML
    Xml,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Text => Self::Text,
            ReportFormatArg::Json => Self::Json,
            ReportFormatArg::Xml => Self::Xml,
        }
    }
}

/// Scan listing format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanFormatArg {
    /// One ID per line
    #[default]
    Text,
    /// JSON array of branches
    Json,
}

impl ScanArgs {
    /// Addressing mode selected by `--ranges`
    #[must_use]
    pub const fn address_mode(&self) -> AddressMode {
        if self.ranges {
            AddressMode::Range
        } else {
            AddressMode::Point
        }
    }
}
