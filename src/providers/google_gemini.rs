use lazy_static::lazy_static;
use serde_json::Value;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    /// The AIza prefix is shared across Google Cloud services; a match here
    /// is confirmed Gemini-capable only by the probe.
    static ref PATTERNS: Vec<KeyPattern> =
        vec![KeyPattern::new("api-key", r"\b(AIza[0-9A-Za-z_-]{35})\b")];
}

pub struct GoogleGeminiProvider;

impl GoogleGeminiProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoogleGeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for GoogleGeminiProvider {
    fn name(&self) -> &'static str {
        "google_gemini"
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://generativelanguage.googleapis.com/v1beta/models"
    }

    /// Google authenticates through a query parameter, not a header.
    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::get(format!("{}?key={}", self.validation_endpoint(), key))
    }

    fn classify_response(&self, status: u16, _body: Option<&Value>) -> ValidationState {
        match status {
            200 => ValidationState::Valid(ProbeOutcome::new(
                status,
                "Key is valid for the Gemini API",
            )),
            // A 400/403 only says the key does not work for Gemini; it may
            // still be a live key for another Google service.
            400 | 403 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Key is invalid or not authorized for the Gemini API",
            )),
            401 => ValidationState::Invalid(ProbeOutcome::new(status, "Key is invalid")),
            429 => ValidationState::QuotaExceeded(ProbeOutcome::new(
                status,
                "Key is valid but quota exceeded",
            )),
            _ => ValidationState::ProbeError(ProbeOutcome::new(
                status,
                format!("Unexpected response: {}", status),
            )),
        }
    }
}
