//! Coverage Report Formatters
//!
//! Plain text, JSON and Cobertura XML generators.

mod cobertura;
mod json;
mod text;

pub use cobertura::CoberturaFormatter;
pub use json::{JsonCovered, JsonFormatter, JsonReport, JsonSummary};
pub use text::TextFormatter;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Machine-readable JSON document
    Json,
    /// Cobertura XML
    Xml,
}

impl ReportFormat {
    /// Conventional file extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}
