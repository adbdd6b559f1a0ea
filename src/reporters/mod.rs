use std::str::FromStr;

use crate::core::config::RedactionConfig;
use crate::core::error::{KeyhoundError, Result};
use crate::core::models::ScanSession;

pub mod console;
pub mod json;
pub mod sarif;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use sarif::SarifReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Json,
    Sarif,
}

impl FromStr for ReportFormat {
    type Err = KeyhoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(ReportFormat::Table),
            "json" => Ok(ReportFormat::Json),
            "sarif" => Ok(ReportFormat::Sarif),
            other => Err(KeyhoundError::Config(format!(
                "unknown report format: {}",
                other
            ))),
        }
    }
}

/// Trait for rendering a scan session into an output document.
pub trait Reporter: Send + Sync {
    /// Generate a report from the session.
    fn generate(&self, session: &ScanSession) -> Result<String>;

    /// The format this reporter outputs.
    fn format(&self) -> ReportFormat;
}

/// Get the reporter for a format, using the session's redaction settings.
pub fn get_reporter(format: ReportFormat, redaction: &RedactionConfig) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Table => Box::new(ConsoleReporter::with_redaction(redaction.clone())),
        ReportFormat::Json => Box::new(JsonReporter::with_redaction(redaction.clone())),
        ReportFormat::Sarif => Box::new(SarifReporter::new()),
    }
}
