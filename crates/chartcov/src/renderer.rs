//! Chart Renderer
//!
//! The renderer expands an instrumented chart into its final text for one
//! values input. It is an external program; this module only runs it and
//! captures what it printed. Interpreting a failure is left to the caller,
//! which surfaces the diagnostic unmodified.

use crate::result::{ChartcovError, ChartcovResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Inputs for one render
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Instrumented chart root
    pub chart_dir: &'a Path,
    /// Values document, if any
    pub values: Option<&'a Path>,
    /// Extra arguments passed through verbatim
    pub extra_args: &'a [String],
}

/// Captured renderer result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    /// Rendered text
    pub stdout: String,
    /// Diagnostic text
    pub stderr: String,
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
}

impl RenderOutput {
    /// Successful render producing `stdout`
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
        }
    }

    /// Failed render with exit `code` and `diagnostic` on stderr
    #[must_use]
    pub fn failure(code: i32, diagnostic: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: diagnostic.into(),
            code: Some(code),
        }
    }

    /// Renderer exited zero
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status for messages
    #[must_use]
    pub fn status(&self) -> String {
        self.code.map_or_else(|| "signal".to_string(), |c| c.to_string())
    }

    /// Renderer's own explanation of a failure, stderr first
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Expands a chart for one values input
pub trait Renderer {
    /// Render the chart described by `request`
    ///
    /// # Errors
    ///
    /// Returns an error only when the renderer could not be run at all; a
    /// renderer that ran and failed is reported through [`RenderOutput`].
    fn render(&self, request: &RenderRequest<'_>) -> ChartcovResult<RenderOutput>;
}

/// Closure-based renderer
pub struct FnRenderer<F>
where
    F: Fn(&RenderRequest<'_>) -> ChartcovResult<RenderOutput>,
{
    render: F,
}

impl<F> std::fmt::Debug for FnRenderer<F>
where
    F: Fn(&RenderRequest<'_>) -> ChartcovResult<RenderOutput>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRenderer").finish_non_exhaustive()
    }
}

impl<F> FnRenderer<F>
where
    F: Fn(&RenderRequest<'_>) -> ChartcovResult<RenderOutput>,
{
    /// Create a new function-based renderer
    #[must_use]
    pub fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&RenderRequest<'_>) -> ChartcovResult<RenderOutput>,
{
    fn render(&self, request: &RenderRequest<'_>) -> ChartcovResult<RenderOutput> {
        (self.render)(request)
    }
}

/// Runs `helm template`
#[derive(Debug, Clone)]
pub struct HelmRenderer {
    /// Path to the helm binary (defaults to "helm")
    program: PathBuf,
}

impl Default for HelmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HelmRenderer {
    /// Create a renderer using `helm` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("helm"),
        }
    }

    /// Set custom helm binary path
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Binary that will be spawned
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check whether the binary answers `version`
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    /// Build the command line for a request
    #[must_use]
    pub fn command(&self, request: &RenderRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("template").arg(request.chart_dir);
        if let Some(values) = request.values {
            cmd.arg("-f").arg(values);
        }
        cmd.args(request.extra_args);
        cmd
    }
}

impl Renderer for HelmRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> ChartcovResult<RenderOutput> {
        let mut cmd = self.command(request);
        tracing::debug!(command = ?cmd, "spawning renderer");
        let output = cmd
            .output()
            .map_err(|e| ChartcovError::RendererUnavailable {
                program: self.program.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(RenderOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}
