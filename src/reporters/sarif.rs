use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{ReportFormat, Reporter};
use crate::core::error::Result;
use crate::core::models::{Candidate, ScanSession};
use crate::providers::registry;

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "keyhound";

/// SARIF 2.1.0 report for code-scanning integrations. Each rule is one
/// `{provider}/{pattern_name}` pair; each result carries the finding's
/// physical location with its line and column range.
pub struct SarifReporter;

impl SarifReporter {
    pub fn new() -> Self {
        Self
    }

    fn rule_id(candidate: &Candidate) -> String {
        format!("{}/{}", candidate.provider, candidate.pattern_name)
    }

    fn rule_for(candidate: &Candidate) -> Value {
        let display_name = registry()
            .get(&candidate.provider)
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| candidate.provider.clone());
        json!({
            "id": Self::rule_id(candidate),
            "name": format!("{}KeyExposure", display_name.replace(' ', "")),
            "shortDescription": {
                "text": format!("Exposed {} API credential", display_name)
            },
            "fullDescription": {
                "text": format!(
                    "An API credential for {} was found in the source tree. \
                     Credentials belong in environment variables or a secret \
                     manager, not in version control.",
                    display_name
                )
            },
            "defaultConfiguration": {"level": "error"},
            "properties": {"tags": ["security", "secrets", candidate.provider]}
        })
    }

    fn result_for(candidate: &Candidate) -> Value {
        json!({
            "ruleId": Self::rule_id(candidate),
            "level": "error",
            "message": {
                "text": format!(
                    "{} credential detected ({}), validation: {}",
                    candidate.provider,
                    candidate.redacted_value(),
                    candidate.validation.label()
                )
            },
            "locations": [{
                "physicalLocation": {
                    "artifactLocation": {"uri": candidate.file_path},
                    "region": {
                        "startLine": candidate.line_number,
                        "startColumn": candidate.column_start,
                        "endLine": candidate.line_number,
                        "endColumn": candidate.column_end,
                    }
                }
            }]
        })
    }
}

impl Default for SarifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for SarifReporter {
    fn generate(&self, session: &ScanSession) -> Result<String> {
        // One rule per (provider, pattern) actually present in the session.
        let mut rules: BTreeMap<String, Value> = BTreeMap::new();
        let mut results: Vec<Value> = Vec::new();

        for result in &session.results {
            for candidate in &result.candidates {
                rules
                    .entry(Self::rule_id(candidate))
                    .or_insert_with(|| Self::rule_for(candidate));
                results.push(Self::result_for(candidate));
            }
        }

        let document = json!({
            "$schema": SARIF_SCHEMA,
            "version": SARIF_VERSION,
            "runs": [{
                "tool": {
                    "driver": {
                        "name": TOOL_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                        "rules": rules.into_values().collect::<Vec<_>>(),
                    }
                },
                "results": results,
            }]
        });

        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Sarif
    }
}
