//! Pattern scanning engine.
//!
//! Applies every registered provider's patterns to a text buffer and emits
//! positioned, context-annotated candidates in a deterministic order.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use uuid::Uuid;

use crate::core::models::{Candidate, ValidationState};
use crate::providers::{registry, Provider};
use crate::utils::entropy::shannon_entropy;

/// How far back from the secret the variable-name heuristic looks.
const VARIABLE_LOOKBEHIND_CHARS: usize = 100;

lazy_static! {
    /// Assignment forms the variable-name heuristic recognizes:
    /// `name = "..."`, `name: "..."`, `"key": "..."`, `export NAME=`.
    static ref VARIABLE_PATTERN: Regex = Regex::new(
        r#"(?x)
        (?:
            ([A-Za-z_][A-Za-z0-9_]*) \s* [:=] \s* ["']
            |
            ["']?([A-Za-z_][A-Za-z0-9_]*)["']? \s* [:=] \s* ["']?
            |
            \b([A-Z_][A-Z0-9_]*) \s* =
        )
        "#
    )
    .expect("invalid variable pattern");
}

pub struct PatternScanner {
    providers: Vec<(usize, &'static dyn Provider)>,
    context_lines: usize,
}

impl PatternScanner {
    /// Scanner over all registered providers with the default context window.
    pub fn new() -> Self {
        Self::with_options(None, 3)
    }

    /// Scanner over a provider subset (by name; `None` means all) and an
    /// explicit context-window size. Unknown names in the filter are
    /// silently dropped; the registration index is kept for ordering.
    pub fn with_options(provider_filter: Option<&[String]>, context_lines: usize) -> Self {
        let providers = registry()
            .all()
            .enumerate()
            .filter(|(_, p)| match provider_filter {
                Some(filter) => filter.iter().any(|name| name == p.name()),
                None => true,
            })
            .collect();
        Self {
            providers,
            context_lines,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.providers.iter().map(|(_, p)| p.patterns().len()).sum()
    }

    /// Scan a text buffer, yielding candidates ordered by
    /// `(line, column_start, provider registration index, pattern index)`
    /// and deduplicated on `(file_path, line, column_start, secret)`.
    pub fn scan_buffer(&self, content: &str, file_path: &str) -> Vec<Candidate> {
        if content.is_empty() {
            return Vec::new();
        }

        let lines: Vec<&str> = content.lines().collect();
        let line_starts = line_start_offsets(content);

        let mut seen: HashSet<(usize, usize, String)> = HashSet::new();
        let mut found: Vec<(usize, usize, Candidate)> = Vec::new();

        for (provider_idx, provider) in &self.providers {
            for (pattern_idx, pattern) in provider.patterns().iter().enumerate() {
                for caps in pattern.regex.captures_iter(content) {
                    let Some(secret_match) = caps.get(1) else {
                        continue;
                    };
                    let secret = secret_match.as_str();

                    // Line/column of the secret itself, not the full match:
                    // contextual patterns may span assignment syntax.
                    let (line_idx, line_start) =
                        locate_line(&line_starts, secret_match.start());
                    let line_number = line_idx + 1;
                    let column_start =
                        content[line_start..secret_match.start()].chars().count() + 1;
                    let column_end = column_start + secret.chars().count();

                    if !seen.insert((line_number, column_start, secret.to_string())) {
                        continue;
                    }

                    let line_content = lines.get(line_idx).copied().unwrap_or("").to_string();
                    let variable_name =
                        extract_variable_name(&line_content, secret_match.start() - line_start);

                    found.push((
                        *provider_idx,
                        pattern_idx,
                        Candidate {
                            id: Uuid::new_v4(),
                            provider: provider.name().to_string(),
                            pattern_name: pattern.name.to_string(),
                            secret_value: secret.to_string(),
                            file_path: file_path.to_string(),
                            line_number,
                            column_start,
                            column_end,
                            line_content,
                            context_before: self.context_before(&lines, line_idx),
                            context_after: self.context_after(&lines, line_idx),
                            variable_name,
                            entropy: shannon_entropy(secret),
                            validation: ValidationState::NotAttempted,
                            validated_at: None,
                        },
                    ));
                }
            }
        }

        found.sort_by(|(ap, an, a), (bp, bn, b)| {
            (a.line_number, a.column_start, *ap, *an).cmp(&(
                b.line_number,
                b.column_start,
                *bp,
                *bn,
            ))
        });

        found.into_iter().map(|(_, _, c)| c).collect()
    }

    /// Scan raw bytes: the longest valid UTF-8 prefix is scanned, anything
    /// after the first invalid sequence is silently skipped.
    pub fn scan_bytes(&self, bytes: &[u8], file_path: &str) -> Vec<Candidate> {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.scan_buffer(text, file_path),
            Err(e) => {
                let prefix = &bytes[..e.valid_up_to()];
                match std::str::from_utf8(prefix) {
                    Ok(text) => self.scan_buffer(text, file_path),
                    Err(_) => Vec::new(),
                }
            }
        }
    }

    fn context_before(&self, lines: &[&str], line_idx: usize) -> String {
        let start = line_idx.saturating_sub(self.context_lines);
        lines[start..line_idx].join("\n").trim().to_string()
    }

    fn context_after(&self, lines: &[&str], line_idx: usize) -> String {
        if line_idx + 1 >= lines.len() {
            return String::new();
        }
        let end = (line_idx + 1 + self.context_lines).min(lines.len());
        lines[line_idx + 1..end].join("\n").trim().to_string()
    }
}

impl Default for PatternScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offsets at which each line begins.
fn line_start_offsets(content: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in content.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// (zero-based line index, byte offset of that line's start) for a position.
fn locate_line(line_starts: &[usize], pos: usize) -> (usize, usize) {
    let idx = line_starts.partition_point(|&s| s <= pos) - 1;
    (idx, line_starts[idx])
}

/// Heuristic variable-name extraction from the text immediately preceding
/// the secret on its line. The last assignment form before the secret wins.
fn extract_variable_name(line_content: &str, secret_byte_offset: usize) -> Option<String> {
    let prefix = line_content.get(..secret_byte_offset)?;

    let trimmed = if prefix.chars().count() > VARIABLE_LOOKBEHIND_CHARS {
        let skip = prefix.chars().count() - VARIABLE_LOOKBEHIND_CHARS;
        let start = prefix
            .char_indices()
            .nth(skip)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &prefix[start..]
    } else {
        prefix
    };

    VARIABLE_PATTERN
        .captures_iter(trimmed)
        .last()
        .and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_nothing() {
        let scanner = PatternScanner::new();
        assert!(scanner.scan_buffer("", "empty.txt").is_empty());
    }

    #[test]
    fn test_counts_follow_the_filter() {
        let all = PatternScanner::new();
        assert_eq!(all.provider_count(), 8);
        assert!(all.pattern_count() > all.provider_count());

        let subset =
            PatternScanner::with_options(Some(&["anthropic".to_string()]), 3);
        assert_eq!(subset.provider_count(), 1);
        assert_eq!(subset.pattern_count(), 2);
    }

    #[test]
    fn test_match_at_buffer_start_is_line_one_column_one() {
        let scanner = PatternScanner::new();
        let key = format!("hf_{}", "k".repeat(34));
        let candidates = scanner.scan_buffer(&key, "a.txt");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].line_number, 1);
        assert_eq!(candidates[0].column_start, 1);
        assert_eq!(candidates[0].column_end, 1 + key.chars().count());
    }

    #[test]
    fn test_line_counting_after_newlines() {
        let scanner = PatternScanner::new();
        let key = format!("r8_{}", "b".repeat(37));
        let content = format!("first\nsecond\ntoken = \"{}\"\n", key);
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].line_number, 3);
        assert_eq!(candidates[0].column_start, 10);
    }

    #[test]
    fn test_secret_at_eof_without_trailing_newline() {
        let scanner = PatternScanner::new();
        let key = format!("gsk_{}", "c".repeat(52));
        let content = format!("x = 1\nkey = {}", key);
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].secret_value, key);
    }

    #[test]
    fn test_variable_name_from_assignment() {
        let scanner = PatternScanner::new();
        let content = format!("API_KEY = \"sk-proj-{}\"", "A".repeat(60));
        let candidates = scanner.scan_buffer(&content, "settings.py");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].variable_name.as_deref(), Some("API_KEY"));
    }

    #[test]
    fn test_variable_name_from_json_key() {
        let scanner = PatternScanner::new();
        let content = format!("\"openai_key\": \"sk-{}\"", "d".repeat(44));
        let candidates = scanner.scan_buffer(&content, "creds.json");
        assert_eq!(candidates[0].variable_name.as_deref(), Some("openai_key"));
    }

    #[test]
    fn test_no_variable_name_without_assignment() {
        let scanner = PatternScanner::new();
        let content = format!("hf_{}", "e".repeat(34));
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert!(candidates[0].variable_name.is_none());
    }

    #[test]
    fn test_context_window_is_trimmed_and_bounded() {
        let scanner = PatternScanner::with_options(None, 2);
        let key = format!("hf_{}", "f".repeat(34));
        let content = format!("l1\nl2\nl3\nl4\nkey = \"{}\"\nl6\nl7\nl8", key);
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert_eq!(candidates[0].context_before, "l3\nl4");
        assert_eq!(candidates[0].context_after, "l6\nl7");
    }

    #[test]
    fn test_provider_filter_limits_matches() {
        let all = PatternScanner::new();
        let only_hf = PatternScanner::with_options(
            Some(&["huggingface".to_string()]),
            3,
        );
        let content = format!(
            "a = \"hf_{}\"\nb = \"r8_{}\"",
            "g".repeat(34),
            "h".repeat(37)
        );
        assert_eq!(all.scan_buffer(&content, "a.txt").len(), 2);
        let filtered = only_hf.scan_buffer(&content, "a.txt");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].provider, "huggingface");
    }

    #[test]
    fn test_candidates_sorted_by_position_not_provider() {
        let scanner = PatternScanner::new();
        // langsmith (registered last) appears on line 1, openai on line 2.
        let content = format!(
            "k1 = \"lsv2_sk_{}\"\nk2 = \"sk-{}\"",
            "i".repeat(32),
            "j".repeat(48)
        );
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].provider, "langsmith");
        assert_eq!(candidates[1].provider, "openai");
    }

    #[test]
    fn test_duplicate_capture_is_deduplicated() {
        let scanner = PatternScanner::new();
        // COHERE_API_KEY assignment satisfies both cohere patterns at the
        // same (line, column, secret); exactly one candidate survives.
        let content = format!("COHERE_API_KEY = \"{}\"", "k".repeat(40));
        let candidates = scanner.scan_buffer(&content, "a.env");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].provider, "cohere");
        assert_eq!(candidates[0].pattern_name, "context-adjacent");
    }

    #[test]
    fn test_scan_is_deterministic() {
        let scanner = PatternScanner::new();
        let content = format!(
            "a = \"sk-ant-api03-{}\"\nb = \"sk-{}\"\nc = \"hf_{}\"",
            "x".repeat(95),
            "y".repeat(48),
            "z".repeat(34)
        );
        let first = scanner.scan_buffer(&content, "a.txt");
        let second = scanner.scan_buffer(&content, "a.txt");
        let strip = |cs: &[Candidate]| {
            cs.iter()
                .map(|c| {
                    (
                        c.provider.clone(),
                        c.pattern_name.clone(),
                        c.secret_value.clone(),
                        c.line_number,
                        c.column_start,
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_scan_bytes_skips_invalid_tail() {
        let scanner = PatternScanner::new();
        let key = format!("hf_{}", "m".repeat(34));
        let mut bytes = format!("k = \"{}\"\n", key).into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, 0x41]);
        let candidates = scanner.scan_bytes(&bytes, "mixed.bin");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].secret_value, key);
    }

    #[test]
    fn test_entropy_is_scored_but_never_filtered() {
        let scanner = PatternScanner::new();
        // All-same-character secret has zero entropy and is still emitted.
        let content = format!("API_KEY = \"sk-proj-{}\"", "A".repeat(60));
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].entropy < 1.0);
    }

    #[test]
    fn test_multibyte_prefix_columns_are_character_counted() {
        let scanner = PatternScanner::new();
        let key = format!("hf_{}", "n".repeat(34));
        let content = format!("émoji_著 = \"{}\"", key);
        let candidates = scanner.scan_buffer(&content, "a.txt");
        assert_eq!(candidates.len(), 1);
        // 8 visible characters precede the secret: é m o j i _ 著 space...
        let expected = content.chars().take_while(|c| *c != 'h').count() + 1;
        assert_eq!(candidates[0].column_start, expected);
    }
}
