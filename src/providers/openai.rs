use lazy_static::lazy_static;
use serde_json::Value;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    /// OpenAI keys: "sk-" with an optional scope segment (proj/org/admin/
    /// svcacct) followed by 20-150 alphanumerics. The character class
    /// excludes "-", which keeps Anthropic's "sk-ant-..." keys out.
    static ref PATTERNS: Vec<KeyPattern> = vec![KeyPattern::new(
        "api-key",
        r"\b(sk-(?:proj-|org-|admin-|svcacct-)?[A-Za-z0-9]{20,150})\b",
    )];
}

pub struct OpenAiProvider;

impl OpenAiProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://api.openai.com/v1/models"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::get(self.validation_endpoint()).bearer(key)
    }

    fn classify_response(&self, status: u16, _body: Option<&Value>) -> ValidationState {
        match status {
            200 => ValidationState::Valid(ProbeOutcome::new(status, "Key is valid and active")),
            401 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Key is invalid or revoked",
            )),
            // A scoped key can list no models yet still be live.
            403 => ValidationState::Valid(ProbeOutcome::new(
                status,
                "Key is valid but restricted in scope",
            )),
            429 => ValidationState::QuotaExceeded(ProbeOutcome::new(
                status,
                "Key is valid but quota exhausted or rate limited",
            )),
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

    fn find(content: &str) -> Vec<String> {
        PATTERNS[0]
            .regex
            .captures_iter(content)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    #[test]
    fn test_matches_project_key() {
        let key = format!("sk-proj-{}", "A".repeat(60));
        let content = format!("API_KEY = \"{}\"", key);
        assert_eq!(find(&content), vec![key]);
    }

    #[test]
    fn test_matches_bare_key() {
        let key = format!("sk-{}", "y".repeat(48));
        assert_eq!(find(&format!("q = \"{}\"", key)), vec![key]);
    }

    #[test]
    fn test_matches_scope_variants() {
        for scope in ["org-", "admin-", "svcacct-"] {
            let key = format!("sk-{}{}", scope, "b".repeat(40));
            assert_eq!(find(&key), vec![key.clone()], "scope {}", scope);
        }
    }

    #[test]
    fn test_rejects_too_short_tail() {
        let content = format!("sk-{}", "a".repeat(19));
        assert!(find(&content).is_empty());
    }

    #[test]
    fn test_does_not_swallow_anthropic_keys() {
        let content = format!("o = \"sk-ant-api03-{}\"", "x".repeat(95));
        assert!(find(&content).is_empty());
    }

    #[test]
    fn test_classification_table() {
        let p = OpenAiProvider::new();
        assert!(matches!(p.classify_response(200, None), ValidationState::Valid(_)));
        assert!(matches!(p.classify_response(401, None), ValidationState::Invalid(_)));
        assert!(matches!(p.classify_response(403, None), ValidationState::Valid(_)));
        assert!(matches!(
            p.classify_response(429, None),
            ValidationState::QuotaExceeded(_)
        ));
        assert!(matches!(
            p.classify_response(500, None),
            ValidationState::ProbeError(_)
        ));
        assert!(matches!(
            p.classify_response(418, None),
            ValidationState::ProbeError(_)
        ));
    }

    #[test]
    fn test_probe_request_shape() {
        let p = OpenAiProvider::new();
        let req = p.build_probe_request("sk-test");
        assert_eq!(req.url, "https://api.openai.com/v1/models");
        assert!(req.body.is_none());
        assert!(req
            .headers
            .iter()
            .any(|(k, v)| k == "Authorization" && v == "Bearer sk-test"));
    }
}
