//! Concurrent validation pipeline.
//!
//! Probes candidate credentials against provider endpoints under a bounded
//! concurrency gate and per-provider rate limits.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::config::ValidatorConfig;
use crate::core::models::{Candidate, ProbeOutcome, ValidationState};
use crate::providers::registry;
use crate::utils::redaction::redact_in_text;

use super::rate_limiter::ProviderLimits;
use super::transport::{CurlTransport, ProbeTransport};

pub struct ValidationClient {
    timeout: Duration,
    transport: Arc<dyn ProbeTransport>,
    limits: Arc<ProviderLimits>,
    gate: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ValidationClient {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            transport: Arc::new(CurlTransport::new()),
            limits: Arc::new(ProviderLimits::for_registry()),
            gate: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            cancel: CancellationToken::new(),
        }
    }

    /// Swap the HTTP transport. Tests use this to mock provider endpoints.
    pub fn with_transport(mut self, transport: Arc<dyn ProbeTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the per-provider rate limits.
    pub fn with_limits(mut self, limits: Arc<ProviderLimits>) -> Self {
        self.limits = limits;
        self
    }

    /// Attach an external cancellation signal. Once it fires, no new probe
    /// starts; probes already in flight may complete.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Probe one candidate and record the outcome. Candidates already in a
    /// terminal state are returned untouched, so re-validation never
    /// re-probes. A cancelled run leaves the candidate `NotAttempted`.
    pub async fn validate_one(&self, mut candidate: Candidate) -> Candidate {
        if !candidate.validation.is_not_attempted() {
            return candidate;
        }

        let Some(provider) = registry().get(&candidate.provider) else {
            candidate.record_validation(ValidationState::Skipped(ProbeOutcome::message(
                format!("Unknown provider: {}", candidate.provider),
            )));
            return candidate;
        };

        // Concurrency gate first, provider pacing second; both are
        // cancellation points.
        let _permit = tokio::select! {
            _ = self.cancel.cancelled() => return candidate,
            permit = self.gate.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return candidate,
            },
        };

        tokio::select! {
            _ = self.cancel.cancelled() => return candidate,
            _ = self.limits.acquire(&candidate.provider) => {}
        }

        let request = provider.build_probe_request(&candidate.secret_value);
        debug!(
            provider = candidate.provider.as_str(),
            secret = candidate.redacted_value().as_str(),
            "probing candidate"
        );

        let state = match tokio::time::timeout(
            self.timeout,
            self.transport.execute(request, self.timeout),
        )
        .await
        {
            Ok(Ok(response)) => {
                let body = response.json();
                provider.classify_response(response.status, body.as_ref())
            }
            Ok(Err(e)) => ValidationState::ProbeError(ProbeOutcome::message(redact_in_text(
                &e.to_string(),
                &candidate.secret_value,
            ))),
            Err(_) => ValidationState::ProbeError(ProbeOutcome::message(format!(
                "Request timed out after {}s",
                self.timeout.as_secs()
            ))),
        };

        debug!(
            provider = candidate.provider.as_str(),
            secret = candidate.redacted_value().as_str(),
            outcome = state.label(),
            "probe classified"
        );

        candidate.record_validation(state);
        candidate
    }

    /// Probe a batch with at most `max_concurrent` requests in flight.
    /// Output order equals input order regardless of completion order;
    /// per-position candidate identity is preserved.
    pub async fn validate_batch(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if candidates.is_empty() {
            return candidates;
        }
        join_all(candidates.into_iter().map(|c| self.validate_one(c))).await
    }
}
