use lazy_static::lazy_static;
use serde_json::Value;
use std::collections::HashMap;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    static ref PATTERNS: Vec<KeyPattern> =
        vec![KeyPattern::new("api-token", r"\b(r8_[A-Za-z0-9]{37})\b")];
}

pub struct ReplicateProvider;

impl ReplicateProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReplicateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for ReplicateProvider {
    fn name(&self) -> &'static str {
        "replicate"
    }

    fn display_name(&self) -> &'static str {
        "Replicate"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://api.replicate.com/v1/account"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::get(self.validation_endpoint()).bearer(key)
    }

    fn classify_response(&self, status: u16, body: Option<&Value>) -> ValidationState {
        match status {
            200 => {
                let mut metadata = HashMap::new();
                if let Some(username) = body
                    .and_then(|b| b.get("username"))
                    .and_then(|u| u.as_str())
                {
                    metadata.insert("username".to_string(), username.to_string());
                }
                ValidationState::Valid(
                    ProbeOutcome::new(status, "Token is valid and active").with_metadata(metadata),
                )
            }
            401 | 403 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Token is invalid or revoked",
            )),
            429 => ValidationState::RateLimited(ProbeOutcome::new(status, "Rate limited")),
            _ => ValidationState::ProbeError(ProbeOutcome::new(
                status,
                format!("Unexpected response: {}", status),
            )),
        }
    }
}
