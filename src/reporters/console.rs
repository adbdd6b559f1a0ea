use colored::Colorize;
use std::fmt::Write as _;

use super::{ReportFormat, Reporter};
use crate::core::config::RedactionConfig;
use crate::core::error::Result;
use crate::core::models::{Candidate, ScanSession, ValidationState};
use crate::utils::redaction::redact;

/// Human-readable report: one block per finding, secrets always redacted,
/// a summary footer per session.
pub struct ConsoleReporter {
    redaction: RedactionConfig,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            redaction: RedactionConfig::default(),
        }
    }

    pub fn with_redaction(redaction: RedactionConfig) -> Self {
        Self { redaction }
    }

    fn redact(&self, secret: &str) -> String {
        redact(
            secret,
            self.redaction.prefix_chars,
            self.redaction.suffix_chars,
            self.redaction.min_length,
        )
    }

    fn validation_line(candidate: &Candidate) -> String {
        match &candidate.validation {
            ValidationState::NotAttempted => "not attempted".normal().to_string(),
            state @ ValidationState::Valid(_) => format!(
                "{} (HTTP {})",
                state.label().bright_green().bold(),
                state.http_status().map_or("-".to_string(), |s| s.to_string())
            ),
            state @ ValidationState::Invalid(_) => state.label().bright_black().to_string(),
            state => format!(
                "{}{}",
                state.label().yellow(),
                state
                    .outcome()
                    .filter(|o| !o.message.is_empty())
                    .map(|o| format!(" ({})", o.message))
                    .unwrap_or_default()
            ),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn generate(&self, session: &ScanSession) -> Result<String> {
        let mut out = String::new();

        for result in &session.results {
            writeln!(out, "{}", "=".repeat(70).bright_cyan()).ok();
            writeln!(out, "  Target: {}", result.target.bright_white()).ok();
            if let Some(commit) = &result.commit {
                writeln!(out, "  Commit: {}", commit).ok();
            }
            writeln!(
                out,
                "  Files scanned: {}   Findings: {}",
                result.files_scanned,
                result.candidates.len()
            )
            .ok();
            writeln!(out, "{}", "=".repeat(70).bright_cyan()).ok();

            for (idx, candidate) in result.candidates.iter().enumerate() {
                writeln!(
                    out,
                    "\n[{}] {} ({})",
                    idx + 1,
                    candidate.provider.bright_yellow(),
                    candidate.pattern_name
                )
                .ok();
                writeln!(
                    out,
                    "  Location: {}:{}:{}",
                    candidate.file_path.bright_white(),
                    candidate.line_number,
                    candidate.column_start
                )
                .ok();
                writeln!(
                    out,
                    "  Secret:   {}",
                    self.redact(&candidate.secret_value).bright_cyan()
                )
                .ok();
                if let Some(variable) = &candidate.variable_name {
                    writeln!(out, "  Variable: {}", variable).ok();
                }
                writeln!(out, "  Entropy:  {:.2}", candidate.entropy).ok();
                writeln!(out, "  Status:   {}", Self::validation_line(candidate)).ok();
            }

            for error in &result.errors {
                writeln!(out, "  {} {}", "!".red(), error).ok();
            }
        }

        let valid_count = session
            .results
            .iter()
            .flat_map(|r| &r.candidates)
            .filter(|c| c.validation.is_valid())
            .count();

        writeln!(out, "\n{}", "  Summary".bright_cyan().bold()).ok();
        writeln!(out, "  Targets: {}", session.results.len()).ok();
        writeln!(out, "  Files scanned: {}", session.total_files_scanned()).ok();
        writeln!(out, "  Findings: {}", session.total_candidates()).ok();
        if session.validation_enabled {
            writeln!(out, "  Confirmed live: {}", valid_count.to_string().bright_green()).ok();
        }

        Ok(out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Table
    }
}
