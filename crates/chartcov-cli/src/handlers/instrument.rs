//! Instrument command handler

use crate::commands::InstrumentArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use chartcov::{Chart, CoverageConfig, CoverageEngine, HelmRenderer};
use std::path::{Path, PathBuf};

/// Execute the instrument command
pub fn execute_instrument(config: &CliConfig, args: &InstrumentArgs) -> CliResult<()> {
    let chart = Chart::load(&args.chart)?;
    if is_within(&args.output, chart.root()) {
        return Err(CliError::invalid_argument(
            "output directory must be outside the chart directory",
        ));
    }
    if !args.force && is_non_empty_dir(&args.output)? {
        return Err(CliError::invalid_argument(format!(
            "output directory {} is not empty (use --force to overwrite)",
            args.output.display()
        )));
    }

    let coverage_config = CoverageConfig::builder()
        .filters(args.filters.clone())
        .build();
    let engine = CoverageEngine::new(chart, coverage_config, HelmRenderer::new())?;
    let discovery = engine.instrument_into(&args.output)?;

    let reporter = ProgressReporter::new(config.use_color(), config.verbosity.is_quiet());
    reporter.scan_notes(&discovery.notes);
    reporter.success(&format!(
        "Instrumented {} branches in {} files into {}",
        discovery.branches.len(),
        discovery.files.len(),
        args.output.display()
    ));
    Ok(())
}

fn is_non_empty_dir(path: &Path) -> CliResult<bool> {
    if !path.exists() {
        return Ok(false);
    }
    if !path.is_dir() {
        return Err(CliError::invalid_argument(format!(
            "output path {} is not a directory",
            path.display()
        )));
    }
    Ok(std::fs::read_dir(path)?.next().is_some())
}

/// `path` is `root` or lies beneath it
fn is_within(path: &Path, root: &Path) -> bool {
    let Ok(root) = root.canonicalize() else {
        return false;
    };
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    resolve(&absolute).starts_with(root)
}

/// Canonicalize the nearest existing ancestor and re-attach the rest
fn resolve(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(base) = current.canonicalize() {
            return missing.iter().rev().fold(base, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
