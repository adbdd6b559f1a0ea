use lazy_static::lazy_static;
use serde_json::Value;

use super::{KeyPattern, ProbeRequest, Provider};
use crate::core::models::{ProbeOutcome, ValidationState};

lazy_static! {
    /// Cohere keys have no distinguishing prefix, so both patterns demand
    /// context: the word "cohere" within 30 characters, or an assignment to
    /// the COHERE_API_KEY variable.
    static ref PATTERNS: Vec<KeyPattern> = vec![
        KeyPattern::new(
            "context-adjacent",
            r#"(?i)cohere[^\n]{0,30}['"]([A-Za-z0-9]{40})['"]"#,
        ),
        KeyPattern::new(
            "env-assignment",
            r#"(?i)COHERE_API_KEY\s*[=:]\s*['"]?([A-Za-z0-9]{40})['"]?"#,
        ),
    ];
}

pub struct CohereProvider;

impl CohereProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CohereProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for CohereProvider {
    fn name(&self) -> &'static str {
        "cohere"
    }

    fn display_name(&self) -> &'static str {
        "Cohere"
    }

    fn patterns(&self) -> &[KeyPattern] {
        &PATTERNS
    }

    fn validation_endpoint(&self) -> &'static str {
        "https://api.cohere.ai/v1/check-api-key"
    }

    fn build_probe_request(&self, key: &str) -> ProbeRequest {
        ProbeRequest::post(self.validation_endpoint(), "{}")
            .bearer(key)
            .header("Content-Type", "application/json")
    }

    fn classify_response(&self, status: u16, body: Option<&Value>) -> ValidationState {
        match status {
            // check-api-key answers 200 either way; the verdict is in the body.
            200 => {
                let is_valid = body
                    .and_then(|b| b.get("valid"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if is_valid {
                    ValidationState::Valid(ProbeOutcome::new(status, "Key is valid and active"))
                } else {
                    ValidationState::Invalid(ProbeOutcome::new(
                        status,
                        "Key validation returned invalid",
                    ))
                }
            }
            401 | 403 => ValidationState::Invalid(ProbeOutcome::new(status, "Key is invalid")),
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
    use serde_json::json;

    fn find_any(content: &str) -> Vec<String> {
        PATTERNS
            .iter()
            .flat_map(|p| {
                p.regex
                    .captures_iter(content)
                    .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_bare_key_without_context_is_ignored() {
        let content = format!("token = \"{}\"", "a".repeat(40));
        assert!(find_any(&content).is_empty());
    }

    #[test]
    fn test_cohere_named_variable_matches() {
        let key = "a".repeat(40);
        let content = format!("cohere_token = \"{}\"", key);
        assert_eq!(find_any(&content), vec![key]);
    }

    #[test]
    fn test_env_assignment_matches_without_quotes() {
        let key = "B".repeat(40);
        let content = format!("COHERE_API_KEY={}", key);
        assert!(find_any(&content).contains(&key));
    }

    #[test]
    fn test_context_window_is_bounded() {
        // "cohere" more than 30 characters away from the quoted key.
        let key = "c".repeat(40);
        let content = format!("cohere {} \"{}\"", "x".repeat(40), key);
        assert!(find_any(&content).is_empty());
    }

    #[test]
    fn test_wrong_length_is_ignored() {
        let content = format!("cohere_key = \"{}\"", "a".repeat(39));
        assert!(find_any(&content).is_empty());
    }

    #[test]
    fn test_body_verdict_drives_classification() {
        let p = CohereProvider::new();
        let valid = json!({"valid": true});
        let invalid = json!({"valid": false});
        assert!(matches!(
            p.classify_response(200, Some(&valid)),
            ValidationState::Valid(_)
        ));
        assert!(matches!(
            p.classify_response(200, Some(&invalid)),
            ValidationState::Invalid(_)
        ));
        // Missing body defaults to invalid rather than guessing valid.
        assert!(matches!(
            p.classify_response(200, None),
            ValidationState::Invalid(_)
        ));
        assert!(matches!(p.classify_response(401, None), ValidationState::Invalid(_)));
    }

    #[test]
    fn test_probe_request_shape() {
        let p = CohereProvider::new();
        let req = p.build_probe_request("k");
        assert_eq!(req.url, "https://api.cohere.ai/v1/check-api-key");
        assert_eq!(req.body.as_deref(), Some("{}"));
    }
}
