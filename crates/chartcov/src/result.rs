//! Result and error types for Chartcov.

use thiserror::Error;

/// Result type for Chartcov operations
pub type ChartcovResult<T> = Result<T, ChartcovError>;

/// Errors that can occur while instrumenting, rendering or reporting a chart
#[derive(Debug, Error)]
pub enum ChartcovError {
    /// Chart root has no manifest
    #[error("Chart manifest not found: {path}")]
    ManifestMissing {
        /// Path that was expected to hold `Chart.yaml`
        path: String,
    },

    /// Chart root has no templates subtree
    #[error("Templates directory not found: {path}")]
    TemplatesMissing {
        /// Path that was expected to hold the templates
        path: String,
    },

    /// Manifest exists but could not be interpreted
    #[error("Invalid chart manifest {path}: {message}")]
    InvalidManifest {
        /// Manifest path
        path: String,
        /// Error message
        message: String,
    },

    /// Renderer exited non-zero for one values input
    ///
    /// `diagnostic` is the renderer's own output, surfaced unmodified.
    #[error("Render failed for {input} (status {status}):\n{diagnostic}")]
    RenderFailed {
        /// Values input label (`<none>` when rendered without values)
        input: String,
        /// Exit status, or `signal` when the process was killed
        status: String,
        /// Renderer diagnostic text
        diagnostic: String,
    },

    /// Renderer binary could not be started
    #[error("Failed to launch renderer `{program}`: {message}")]
    RendererUnavailable {
        /// Program that was spawned
        program: String,
        /// Error message
        message: String,
    },

    /// A sentinel line was found but its payload was malformed
    #[error("Invalid coverage trace on line {line}: {message}")]
    InvalidTrace {
        /// 1-indexed line in the rendered output
        line: usize,
        /// Error message
        message: String,
    },

    /// Staging or writing the scratch workspace failed
    #[error("Workspace error: {message}")]
    Workspace {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Token pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl ChartcovError {
    /// Create a workspace error
    #[must_use]
    pub fn workspace(message: impl Into<String>) -> Self {
        Self::Workspace {
            message: message.into(),
        }
    }

    /// Create an invalid trace error
    #[must_use]
    pub fn invalid_trace(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidTrace {
            line,
            message: message.into(),
        }
    }
}
