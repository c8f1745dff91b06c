//! Values input expansion
//!
//! Each `-f` argument becomes one or more runs: a file is one run, a
//! directory is one run per `*.yaml`/`*.yml` document inside it, sorted.
//! No arguments at all means a single run with the chart's defaults.

use crate::error::{CliError, CliResult};
use chartcov::ValuesInput;
use std::path::{Path, PathBuf};

const VALUES_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Expand `-f` arguments into run inputs
pub fn expand_values(paths: &[PathBuf]) -> CliResult<Vec<ValuesInput>> {
    if paths.is_empty() {
        return Ok(vec![ValuesInput::none()]);
    }

    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let documents = values_in_dir(path)?;
            if documents.is_empty() {
                return Err(CliError::invalid_argument(format!(
                    "no values files (*.yaml, *.yml) in {}",
                    path.display()
                )));
            }
            tracing::debug!(dir = %path.display(), documents = documents.len(), "values directory");
            inputs.extend(documents.into_iter().map(ValuesInput::file));
        } else if path.is_file() {
            inputs.push(ValuesInput::file(path));
        } else {
            return Err(CliError::invalid_argument(format!(
                "values input not found: {}",
                path.display()
            )));
        }
    }
    tracing::debug!(args = paths.len(), runs = inputs.len(), "expanded values inputs");
    Ok(inputs)
}

/// Values documents directly inside `dir`, sorted
pub fn values_in_dir(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let mut documents = Vec::new();
    for ext in VALUES_EXTENSIONS {
        let pattern = format!("{base}/*.{ext}");
        let entries =
            glob::glob(&pattern).map_err(|e| CliError::invalid_argument(e.to_string()))?;
        for entry in entries {
            let path = entry.map_err(|e| CliError::Io(e.into_error()))?;
            if path.is_file() {
                documents.push(path);
            }
        }
    }
    documents.sort();
    Ok(documents)
}
