pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;

pub use config::{Config, RedactionConfig, ScannerConfig, ValidatorConfig};
pub use error::{KeyhoundError, Result};
pub use models::{Candidate, ProbeOutcome, ScanResult, ScanSession, ValidationState};
pub use orchestrator::Orchestrator;
