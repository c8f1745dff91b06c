//! Scratch Workspace
//!
//! Instrumentation never touches the source chart. The chart tree is copied
//! into a temporary directory that is removed when the [`Workspace`] is
//! dropped, on success and on error paths alike.

use crate::chart::{relative_slash_path, Chart};
use crate::result::{ChartcovError, ChartcovResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Directory name of the staged chart inside the scratch directory
const STAGED_CHART_DIR: &str = "chart";

/// Exclusive scratch copy of a chart
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    chart_dir: PathBuf,
}

impl Workspace {
    /// Copy `chart` into a fresh temporary directory
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created or
    /// the chart tree cannot be copied.
    pub fn stage(chart: &Chart) -> ChartcovResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("chartcov-")
            .tempdir()
            .map_err(|e| ChartcovError::workspace(format!("creating scratch directory: {e}")))?;
        let chart_dir = dir.path().join(STAGED_CHART_DIR);
        copy_tree(chart.root(), &chart_dir)?;
        tracing::debug!(path = %chart_dir.display(), "staged chart");
        Ok(Self { dir, chart_dir })
    }

    /// Root of the staged chart
    #[must_use]
    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    /// Scratch directory holding the staged chart
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Overwrite a chart-relative file in the staged copy
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_file(&self, relative_path: &str, contents: &str) -> ChartcovResult<()> {
        write_relative(&self.chart_dir, relative_path, contents)
    }
}

/// Write `contents` to `root/relative_path`, creating parent directories
pub(crate) fn write_relative(root: &Path, relative_path: &str, contents: &str) -> ChartcovResult<()> {
    let target = relative_path
        .split('/')
        .fold(root.to_path_buf(), |path, segment| path.join(segment));
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, contents)?;
    Ok(())
}

/// Recursively copy `src` to `dest`
///
/// Symbolic links are followed, so the copy holds regular files only.
pub(crate) fn copy_tree(src: &Path, dest: &Path) -> ChartcovResult<()> {
    std::fs::create_dir_all(dest)?;
    for entry in WalkDir::new(src).follow_links(true).min_depth(1) {
        let entry = entry.map_err(|e| ChartcovError::workspace(format!("copying chart: {e}")))?;
        let relative = relative_slash_path(src, entry.path());
        let target = relative
            .split('/')
            .fold(dest.to_path_buf(), |path, segment| path.join(segment));
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            let _ = std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
