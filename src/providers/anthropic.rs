use lazy_static::lazy_static;
use serde_json::{json, Value};

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

/// API version header required by the messages endpoint.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Cheapest model accepted by the probe; max_tokens=1 keeps the request at
/// the smallest billable unit even when the key turns out to be live.
const PROBE_MODEL: &str = "claude-3-haiku-20240307";

lazy_static! {
    static ref PATTERNS: Vec<KeyPattern> = vec![
        // Standard API keys, version segment flexible (api01, api03, ...).
        KeyPattern::new(
            "api-key",
            r"\b(sk-ant-api\d{2}-[A-Za-z0-9_-]{80,120})\b",
        ),
        KeyPattern::new("admin-key", r"\b(sk-ant-admin-[A-Za-z0-9_-]{20,})\b"),
    ];
}

pub struct AnthropicProvider;

impl AnthropicProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn display_name(&self) -> &'static str {
        "Anthropic"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://api.anthropic.com/v1/messages"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        let body = json!({
            "model": PROBE_MODEL,
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "Hi"}],
        });
        ProbeRequest::post(self.validation_endpoint(), body.to_string())
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
    }

    fn classify_response(&self, status: u16, body: Option<&Value>) -> ValidationState {
        match status {
            200 => ValidationState::Valid(ProbeOutcome::new(status, "Key is valid and active")),
            401 | 403 => ValidationState::Invalid(ProbeOutcome::new(
                status,
                "Key is invalid or revoked",
            )),
            400 => {
                // A 400 whose error message mentions credits means the key
                // authenticated but the account cannot pay for the request.
                let error_msg = body
                    .and_then(|b| b.get("error"))
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_lowercase())
                    .unwrap_or_default();

                if error_msg.contains("credit") || error_msg.contains("balance") {
                    ValidationState::QuotaExceeded(ProbeOutcome::new(
                        status,
                        "Key is valid but the account has insufficient credits",
                    ))
                } else {
                    ValidationState::ProbeError(ProbeOutcome::new(
                        status,
                        "Bad request without a credit indicator",
                    ))
                }
            }
            429 => ValidationState::RateLimited(ProbeOutcome::new(
                status,
                "Key is valid but rate limited",
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

    fn find_all(content: &str) -> Vec<(&'static str, String)> {
        PATTERNS
            .iter()
            .flat_map(|p| {
                p.regex
                    .captures_iter(content)
                    .filter_map(|c| c.get(1).map(|m| (p.name, m.as_str().to_string())))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_matches_api_key() {
        let key = format!("sk-ant-api03-{}", "x".repeat(95));
        let found = find_all(&format!("o = \"{}\"", key));
        assert_eq!(found, vec![("api-key", key)]);
    }

    #[test]
    fn test_api_key_version_segment_is_flexible() {
        let key = format!("sk-ant-api01-{}", "k".repeat(80));
        assert_eq!(find_all(&key).len(), 1);
    }

    #[test]
    fn test_matches_admin_key() {
        let key = format!("sk-ant-admin-{}", "Z".repeat(24));
        let found = find_all(&key);
        assert_eq!(found, vec![("admin-key", key)]);
    }

    #[test]
    fn test_rejects_short_tail() {
        let content = format!("sk-ant-api03-{}", "x".repeat(40));
        assert!(find_all(&content).is_empty());
    }

    #[test]
    fn test_probe_request_is_wire_exact() {
        let p = AnthropicProvider::new();
        let req = p.build_probe_request("sk-ant-api03-test");
        assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
        assert!(req
            .headers
            .iter()
            .any(|(k, v)| k == "x-api-key" && v == "sk-ant-api03-test"));
        assert!(req
            .headers
            .iter()
            .any(|(k, v)| k == "anthropic-version" && v == "2023-06-01"));

        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["model"], "claude-3-haiku-20240307");
        assert_eq!(body["max_tokens"], 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hi");
    }

    #[test]
    fn test_credit_balance_maps_to_quota_exceeded() {
        let p = AnthropicProvider::new();
        let body = json!({"error": {"message": "Your credit balance is too low"}});
        assert!(matches!(
            p.classify_response(400, Some(&body)),
            ValidationState::QuotaExceeded(_)
        ));
    }

    #[test]
    fn test_credit_check_is_case_insensitive() {
        let p = AnthropicProvider::new();
        let body = json!({"error": {"message": "Insufficient CREDIT remaining"}});
        assert!(matches!(
            p.classify_response(400, Some(&body)),
            ValidationState::QuotaExceeded(_)
        ));
    }

    #[test]
    fn test_other_400_is_probe_error() {
        let p = AnthropicProvider::new();
        let body = json!({"error": {"message": "invalid model"}});
        assert!(matches!(
            p.classify_response(400, Some(&body)),
            ValidationState::ProbeError(_)
        ));
        assert!(matches!(
            p.classify_response(400, None),
            ValidationState::ProbeError(_)
        ));
    }

    #[test]
    fn test_classification_table() {
        let p = AnthropicProvider::new();
        assert!(matches!(p.classify_response(200, None), ValidationState::Valid(_)));
        assert!(matches!(p.classify_response(401, None), ValidationState::Invalid(_)));
        assert!(matches!(
            p.classify_response(429, None),
            ValidationState::RateLimited(_)
        ));
        assert!(matches!(
            p.classify_response(503, None),
            ValidationState::ProbeError(_)
        ));
    }
}
