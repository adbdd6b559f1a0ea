use lazy_static::lazy_static;
use serde_json::Value;
use std::collections::HashMap;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    // User access tokens: hf_ + exactly 34 alphanumerics (37 chars total).
    static ref PATTERNS: Vec<KeyPattern> =
        vec![KeyPattern::new("user-access-token", r"\b(hf_[A-Za-z0-9]{34})\b")];
}

pub struct HuggingFaceProvider;

impl HuggingFaceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HuggingFaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn display_name(&self) -> &'static str {
        "Hugging Face"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://huggingface.co/api/whoami-v2"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::get(self.validation_endpoint()).bearer(key)
    }

    fn classify_response(&self, status: u16, body: Option<&Value>) -> ValidationState {
        match status {
            200 => {
                let mut metadata = HashMap::new();
                if let Some(body) = body {
                    if let Some(name) = body.get("name").and_then(|n| n.as_str()) {
                        metadata.insert("username".to_string(), name.to_string());
                    }
                    // whoami-v2 nests token details under auth.accessToken.
                    let token_info = body.get("auth").and_then(|a| a.get("accessToken"));
                    if let Some(role) = token_info
                        .and_then(|t| t.get("role"))
                        .and_then(|r| r.as_str())
                    {
                        metadata.insert("scopes".to_string(), role.to_string());
                    }
                    if let Some(display_name) = token_info
                        .and_then(|t| t.get("displayName"))
                        .and_then(|d| d.as_str())
                    {
                        metadata.insert("token_name".to_string(), display_name.to_string());
                    }
                }
                ValidationState::Valid(
                    ProbeOutcome::new(status, "Token is valid and active").with_metadata(metadata),
                )
            }
            401 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Token is invalid or revoked",
            )),
            403 => ValidationState::Valid(ProbeOutcome::new(
                status,
                "Token is valid but lacks the required scope",
            )),
            429 => ValidationState::RateLimited(ProbeOutcome::new(status, "Rate limited")),
            _ => ValidationState::ProbeError(ProbeOutcome::new(
                status,
                format!("Unexpected response: {}", status),
            )),
        }
    }
}
