use lazy_static::lazy_static;
use serde_json::Value;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    static ref PATTERNS: Vec<KeyPattern> =
        vec![KeyPattern::new("api-key", r"\b(gsk_[A-Za-z0-9]{50,})\b")];
}

pub struct GroqProvider;

impl GroqProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GroqProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn display_name(&self) -> &'static str {
        "Groq"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://api.groq.com/openai/v1/models"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::get(self.validation_endpoint()).bearer(key)
    }

    fn classify_response(&self, status: u16, _body: Option<&Value>) -> ValidationState {
        match status {
            200 => ValidationState::Valid(ProbeOutcome::new(status, "Key is valid and active")),
            401 | 403 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Key is invalid or revoked",
            )),
            429 => ValidationState::RateLimited(ProbeOutcome::new(status, "Rate limited")),
            _ => ValidationState::ProbeError(ProbeOutcome::new(
                status,
                format!("Unexpected response: {}", status),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_length_is_fifty() {
        let regex = &PATTERNS[0].regex;
        assert!(!regex.is_match(&format!("gsk_{}", "a".repeat(49))));
        assert!(regex.is_match(&format!("gsk_{}", "a".repeat(50))));
        assert!(regex.is_match(&format!("gsk_{}", "a".repeat(56))));
    }

    #[test]
    fn test_classification_table() {
        let p = GroqProvider::new();
        assert!(matches!(p.classify_response(200, None), ValidationState::Valid(_)));
        assert!(matches!(p.classify_response(401, None), ValidationState::Invalid(_)));
        assert!(matches!(
            p.classify_response(429, None),
            ValidationState::RateLimited(_)
        ));
        assert!(matches!(
            p.classify_response(500, None),
            ValidationState::ProbeError(_)
        ));
    }
}
