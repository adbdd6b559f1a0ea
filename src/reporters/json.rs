use serde_json::Value;

use super::{ReportFormat, Reporter};
use crate::core::config::RedactionConfig;
use crate::core::error::Result;
use crate::core::models::ScanSession;
use crate::utils::redaction::redact;

/// Machine-readable report: the session serialized in its native shape,
/// with secret values replaced by their redacted forms.
pub struct JsonReporter {
    redaction: RedactionConfig,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self {
            redaction: RedactionConfig::default(),
        }
    }

    pub fn with_redaction(redaction: RedactionConfig) -> Self {
        Self { redaction }
    }

    fn redact_candidates(&self, session_json: &mut Value) {
        let Some(results) = session_json
            .get_mut("results")
            .and_then(|r| r.as_array_mut())
        else {
            return;
        };
        for result in results {
            let Some(candidates) = result
                .get_mut("candidates")
                .and_then(|c| c.as_array_mut())
            else {
                continue;
            };
            for candidate in candidates {
                let redacted = candidate.get("secret_value").and_then(|s| s.as_str()).map(
                    |secret| {
                        redact(
                            secret,
                            self.redaction.prefix_chars,
                            self.redaction.suffix_chars,
                            self.redaction.min_length,
                        )
                    },
                );
                if let (Some(redacted), Some(obj)) = (redacted, candidate.as_object_mut()) {
                    obj.insert("secret_value".to_string(), Value::String(redacted));
                }
            }
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn generate(&self, session: &ScanSession) -> Result<String> {
        let mut value = serde_json::to_value(session)?;
        self.redact_candidates(&mut value);
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ScanResult;
    use crate::scanner::PatternScanner;

    #[test]
    fn test_json_matches_session_shape_with_redacted_secrets() {
        let scanner = PatternScanner::new();
        let content = format!("t = \"hf_{}\"", "q".repeat(34));
        let mut result = ScanResult::new("demo");
        result.candidates = scanner.scan_buffer(&content, "a.py");
        result.complete();
        let secret = result.candidates[0].secret_value.clone();

        let mut session = ScanSession::new(vec!["demo".into()], false);
        session.results.push(result);
        session.complete();

        let json = JsonReporter::new().generate(&session).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["targets"][0], "demo");
        assert_eq!(parsed["validation_enabled"], false);
        let candidate = &parsed["results"][0]["candidates"][0];
        assert_eq!(candidate["provider"], "huggingface");
        assert_eq!(candidate["line_number"], 1);
        let emitted = candidate["secret_value"].as_str().unwrap();
        assert_ne!(emitted, secret);
        assert!(emitted.starts_with("hf_"));
    }
}
