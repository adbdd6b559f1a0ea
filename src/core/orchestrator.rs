//! Session orchestration: fetch → walk → scan → validate.
//!
//! Thin integration surface over the core components. Per-target failures
//! are accumulated in the result; they never abort the session.

use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::models::{ScanResult, ScanSession};
use crate::fetcher::{is_remote_target, FileWalker, GitFetcher};
use crate::scanner::PatternScanner;
use crate::utils::entropy::is_high_entropy;
use crate::validator::ValidationClient;

pub struct Orchestrator {
    config: Config,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an external cancellation signal. The scanner observes it
    /// between files, the validator at every suspension point; partial
    /// results are still returned.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn scanner(&self) -> PatternScanner {
        PatternScanner::with_options(
            self.config.scanner.provider_filter.as_deref(),
            self.config.scanner.context_lines,
        )
    }

    /// Run a full session over the given targets.
    pub async fn run_session(&self, targets: &[String]) -> ScanSession {
        let mut session =
            ScanSession::new(targets.to_vec(), self.config.validator.enabled);

        for target in targets {
            if self.cancel.is_cancelled() {
                break;
            }
            let mut result = self.scan_target(target).await;

            if self.config.validator.enabled && !result.candidates.is_empty() {
                info!(
                    "Validating {} candidates from {}",
                    result.candidates.len(),
                    target
                );
                let client = ValidationClient::new(&self.config.validator)
                    .with_cancellation(self.cancel.clone());
                let candidates = std::mem::take(&mut result.candidates);
                result.candidates = client.validate_batch(candidates).await;
            }

            session.results.push(result);
        }

        session.complete();
        session
    }

    /// Scan one target, dispatching on remote URL vs local path.
    pub async fn scan_target(&self, target: &str) -> ScanResult {
        if is_remote_target(target) {
            self.scan_repo(target).await
        } else {
            let path = Path::new(target);
            if !path.exists() {
                let mut result = ScanResult::new(target);
                result
                    .errors
                    .push(format!("target does not exist: {}", target));
                result.complete();
                return result;
            }
            self.scan_path(path, target).await
        }
    }

    async fn scan_repo(&self, url: &str) -> ScanResult {
        let mut result = ScanResult::new(url);

        let mut fetcher = match GitFetcher::new(url) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                result.errors.push(e.to_string());
                result.complete();
                return result;
            }
        };

        // The temp checkout is owned by the fetcher and removed when it
        // drops, on every path out of this function.
        match fetcher.clone_repo().await {
            Ok(_) => {}
            Err(e) => {
                result.errors.push(e.to_string());
                result.complete();
                return result;
            }
        }

        match fetcher.head_commit().await {
            Ok(commit) => result.commit = Some(commit),
            Err(e) => warn!("Could not resolve HEAD for {}: {}", url, e),
        }

        if let Some(checkout) = fetcher.checkout_path() {
            let mut scanned = self.scan_path(checkout, url).await;
            scanned.commit = result.commit.take();
            scanned.errors.splice(0..0, result.errors);
            return scanned;
        }

        result.complete();
        result
    }

    /// Scan a directory tree. The cancellation signal is checked between
    /// files, never mid-file.
    pub async fn scan_path(&self, root: &Path, target_label: &str) -> ScanResult {
        let mut result = ScanResult::new(target_label);
        let scanner = self.scanner();
        let walker = FileWalker::from_config(root, &self.config.scanner);

        for file in walker.files() {
            if self.cancel.is_cancelled() {
                info!("Scan of {} cancelled; returning partial results", target_label);
                break;
            }

            let text = match FileWalker::read_text(&file.path) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    result
                        .errors
                        .push(format!("{}: {}", file.relative, e));
                    continue;
                }
            };

            result.files_scanned += 1;
            result
                .candidates
                .extend(scanner.scan_buffer(&text, &file.relative));
        }

        // Entropy is scored by the scanner but never filtered there; the
        // threshold only informs triage.
        let high_entropy = result
            .candidates
            .iter()
            .filter(|c| is_high_entropy(&c.secret_value, self.config.scanner.entropy_threshold))
            .count();
        debug!(
            "{}: {} findings, {} above the entropy threshold",
            target_label,
            result.candidates.len(),
            high_entropy
        );

        result.complete();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Config::default())
    }

    #[tokio::test]
    async fn test_scan_path_finds_secrets_across_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            format!("API_KEY = \"sk-proj-{}\"", "A".repeat(60)),
        )
        .unwrap();
        fs::write(
            dir.path().join("config.env"),
            format!("HF_TOKEN=hf_{}", "b".repeat(34)),
        )
        .unwrap();
        fs::write(dir.path().join("clean.txt"), "nothing here").unwrap();

        let result = orchestrator().scan_path(dir.path(), "local").await;
        assert_eq!(result.files_scanned, 3);
        assert_eq!(result.candidates.len(), 2);
        assert!(result.errors.is_empty());
        assert!(result.scan_completed_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_target_is_an_error_not_a_panic() {
        let result = orchestrator().scan_target("/definitely/not/here").await;
        assert_eq!(result.files_scanned, 0);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_session_returns_partial_results() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "data").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let orch = Orchestrator::new(Config::default()).with_cancellation(cancel);
        let session = orch.run_session(&[dir.path().display().to_string()]).await;

        // Cancelled before any target was scanned.
        assert!(session.results.is_empty());
        assert!(session.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_session_aggregates_multiple_targets() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        fs::write(
            dir_a.path().join("k.env"),
            format!("X=r8_{}", "c".repeat(37)),
        )
        .unwrap();
        fs::write(dir_b.path().join("empty.txt"), "plain").unwrap();

        let targets = vec![
            dir_a.path().display().to_string(),
            dir_b.path().display().to_string(),
        ];
        let session = orchestrator().run_session(&targets).await;

        assert_eq!(session.results.len(), 2);
        assert_eq!(session.total_candidates(), 1);
        assert!(!session.validation_enabled);
    }
}
