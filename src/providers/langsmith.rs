use lazy_static::lazy_static;
use serde_json::Value;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    // Service keys (sk) and personal tokens (pt) share one shape.
    static ref PATTERNS: Vec<KeyPattern> = vec![KeyPattern::new(
        "service-or-personal-key",
        r"\b(lsv2_(?:sk|pt)_[A-Za-z0-9]{32,})\b",
    )];
}

pub struct LangSmithProvider;

impl LangSmithProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LangSmithProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for LangSmithProvider {
    fn name(&self) -> &'static str {
        "langsmith"
    }

    fn display_name(&self) -> &'static str {
        "LangSmith"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://api.smith.langchain.com/api/v1/sessions"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::get(self.validation_endpoint()).header("x-api-key", key)
    }

    fn classify_response(&self, status: u16, _body: Option<&Value>) -> ValidationState {
        match status {
            200 => ValidationState::Valid(ProbeOutcome::new(status, "Key is valid and active")),
            401 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Key is invalid or revoked",
            )),
            403 => ValidationState::Valid(ProbeOutcome::new(
                status,
                "Key is valid but lacks permissions",
            )),
            429 => ValidationState::RateLimited(ProbeOutcome::new(status, "Rate limited")),
            _ => ValidationState::ProbeError(ProbeOutcome::new(
                status,
                format!("Unexpected response: {}", status),
            )),
        }
    }
}
