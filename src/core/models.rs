use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::utils::redaction;

/// Payload recorded alongside a probe-derived validation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProbeOutcome {
    pub http_status: Option<u16>,
    pub message: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl ProbeOutcome {
    pub fn new(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            http_status: Some(http_status),
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    /// Outcome with no HTTP status, for failures before a response exists.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            http_status: None,
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Validation outcome for a candidate.
///
/// `NotAttempted` is the initial state; it transitions at most once to one
/// of the probe-derived states, all of which are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "outcome", rename_all = "snake_case")]
pub enum ValidationState {
    #[default]
    NotAttempted,
    Valid(ProbeOutcome),
    Invalid(ProbeOutcome),
    QuotaExceeded(ProbeOutcome),
    RateLimited(ProbeOutcome),
    ProbeError(ProbeOutcome),
    Skipped(ProbeOutcome),
}

impl ValidationState {
    pub fn is_not_attempted(&self) -> bool {
        matches!(self, ValidationState::NotAttempted)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationState::Valid(_))
    }

    pub fn outcome(&self) -> Option<&ProbeOutcome> {
        match self {
            ValidationState::NotAttempted => None,
            ValidationState::Valid(o)
            | ValidationState::Invalid(o)
            | ValidationState::QuotaExceeded(o)
            | ValidationState::RateLimited(o)
            | ValidationState::ProbeError(o)
            | ValidationState::Skipped(o) => Some(o),
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        self.outcome().and_then(|o| o.http_status)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValidationState::NotAttempted => "not_attempted",
            ValidationState::Valid(_) => "valid",
            ValidationState::Invalid(_) => "invalid",
            ValidationState::QuotaExceeded(_) => "quota_exceeded",
            ValidationState::RateLimited(_) => "rate_limited",
            ValidationState::ProbeError(_) => "probe_error",
            ValidationState::Skipped(_) => "skipped",
        }
    }
}

/// A positioned potential-secret finding emitted by the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub provider: String,
    pub pattern_name: String,
    pub secret_value: String,
    pub file_path: String,
    /// 1-based line of the secret's first character.
    pub line_number: usize,
    /// 1-based character column of the secret's first character.
    pub column_start: usize,
    /// Exclusive end column of the secret.
    pub column_end: usize,
    pub line_content: String,
    pub context_before: String,
    pub context_after: String,
    pub variable_name: Option<String>,
    pub entropy: f64,
    #[serde(default)]
    pub validation: ValidationState,
    pub validated_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Return a redacted form of the secret, safe for display and logs.
    pub fn redacted_value(&self) -> String {
        redaction::redact_default(&self.secret_value)
    }

    /// Record a validation outcome. The transition out of `NotAttempted`
    /// happens at most once; later calls against a terminal state are
    /// ignored, which is what makes re-validation idempotent.
    pub fn record_validation(&mut self, state: ValidationState) {
        if !self.validation.is_not_attempted() {
            return;
        }
        if state.is_not_attempted() {
            return;
        }
        self.validation = state;
        self.validated_at = Some(Utc::now());
    }
}

/// Per-target aggregation of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub target: String,
    pub commit: Option<String>,
    pub scan_started_at: DateTime<Utc>,
    pub scan_completed_at: Option<DateTime<Utc>>,
    pub files_scanned: usize,
    pub candidates: Vec<Candidate>,
    pub errors: Vec<String>,
}

impl ScanResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            commit: None,
            scan_started_at: Utc::now(),
            scan_completed_at: None,
            files_scanned: 0,
            candidates: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn complete(&mut self) {
        self.scan_completed_at = Some(Utc::now());
    }

    pub fn duration(&self) -> chrono::Duration {
        match self.scan_completed_at {
            Some(end) => end - self.scan_started_at,
            None => chrono::Duration::zero(),
        }
    }
}

/// One invocation of the system: targets in, results out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub targets: Vec<String>,
    pub results: Vec<ScanResult>,
    pub validation_enabled: bool,
}

impl ScanSession {
    pub fn new(targets: Vec<String>, validation_enabled: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            targets,
            results: Vec::new(),
            validation_enabled,
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn total_candidates(&self) -> usize {
        self.results.iter().map(|r| r.candidates.len()).sum()
    }

    pub fn total_files_scanned(&self) -> usize {
        self.results.iter().map(|r| r.files_scanned).sum()
    }
}
