//! Error types for the CLI

use chartcov::ChartcovError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Chartcov library error
    #[error("{0}")]
    Chartcov(#[from] ChartcovError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Report generation error
    #[error("Report generation failed: {message}")]
    ReportGeneration {
        /// Error message
        message: String,
    },

    /// Cumulative coverage is below `--fail-under`
    #[error("Coverage {actual:.2}% is below the required {threshold:.2}%")]
    CoverageBelowThreshold {
        /// Measured coverage percentage
        actual: f64,
        /// Required coverage percentage
        threshold: f64,
    },
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a report generation error
    #[must_use]
    pub fn report_generation(message: impl Into<String>) -> Self {
        Self::ReportGeneration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
        assert!(err.to_string().contains("bad arg"));
    }

    #[test]
    fn test_report_generation_error() {
        let err = CliError::report_generation("disk full");
        assert!(err.to_string().contains("Report generation failed"));
    }

    #[test]
    fn test_threshold_error() {
        let err = CliError::CoverageBelowThreshold {
            actual: 50.0,
            threshold: 80.0,
        };
        assert_eq!(
            err.to_string(),
            "Coverage 50.00% is below the required 80.00%"
        );
    }

    #[test]
    fn test_library_error_is_forwarded_verbatim() {
        let err: CliError = ChartcovError::RenderFailed {
            input: "prod.yaml".to_string(),
            status: "1".to_string(),
            diagnostic: "Error: boom".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Render failed for prod.yaml (status 1):\nError: boom"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O error"));
    }
}
