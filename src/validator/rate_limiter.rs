use governor::{Quota, RateLimiter as GovernorRateLimiter};
use nonzero_ext::*;
use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::core::error::{KeyhoundError, Result};
use crate::providers::registry;

type DirectLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Token bucket bounding outbound probe rate: a steady refill rate plus a
/// burst capacity, waiters suspended until tokens are available.
pub struct TokenBucket {
    limiter: DirectLimiter,
    rate_per_second: u32,
    burst: u32,
}

impl TokenBucket {
    pub fn new(rate_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(rate_per_second).unwrap())
            .allow_burst(NonZeroU32::new(burst).unwrap());
        Self {
            limiter: GovernorRateLimiter::direct(quota),
            rate_per_second,
            burst,
        }
    }

    /// Wait until one token is available, then consume it.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Wait for `n` tokens. Asking for more than the burst capacity can
    /// never succeed and is reported as a configuration error.
    pub async fn acquire_n(&self, n: u32) -> Result<()> {
        let n = NonZeroU32::new(n.max(1)).unwrap_or(nonzero!(1u32));
        self.limiter
            .until_n_ready(n)
            .await
            .map_err(|e| KeyhoundError::RateLimit(format!("burst capacity exceeded: {}", e)))
    }

    /// Consume one token if available, without waiting.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn try_acquire_n(&self, n: u32) -> bool {
        let Some(n) = NonZeroU32::new(n) else {
            return true;
        };
        matches!(self.limiter.check_n(n), Ok(Ok(())))
    }

    pub fn rate_per_second(&self) -> u32 {
        self.rate_per_second
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }
}

/// Conservative per-provider quotas. Kept low on purpose: probe traffic
/// must stay under provider abuse-detection thresholds.
const PROVIDER_QUOTAS: &[(&str, u32, u32)] = &[
    ("openai", 2, 10),
    ("anthropic", 2, 10),
    ("huggingface", 5, 10),
    ("cohere", 2, 10),
    ("replicate", 2, 10),
    ("google_gemini", 2, 10),
    ("groq", 5, 10),
    ("langsmith", 2, 10),
];

const FALLBACK_RATE: u32 = 1;
const FALLBACK_BURST: u32 = 5;

/// One token bucket per registered provider, keyed by name, so a slow or
/// throttled provider never blocks probes bound for the others.
pub struct ProviderLimits {
    buckets: HashMap<String, TokenBucket>,
    fallback: TokenBucket,
}

impl ProviderLimits {
    /// Buckets for every registered provider using the conservative
    /// per-provider quota table.
    pub fn for_registry() -> Self {
        let mut buckets = HashMap::new();
        for provider in registry().all() {
            let (rate, burst) = PROVIDER_QUOTAS
                .iter()
                .find(|(name, _, _)| *name == provider.name())
                .map(|(_, r, b)| (*r, *b))
                .unwrap_or((FALLBACK_RATE, FALLBACK_BURST));
            buckets.insert(provider.name().to_string(), TokenBucket::new(rate, burst));
        }
        Self {
            buckets,
            fallback: TokenBucket::new(FALLBACK_RATE, FALLBACK_BURST),
        }
    }

    /// Identical quota for every provider. Used by tests and callers that
    /// need pacing disabled in a controlled environment.
    pub fn uniform(rate_per_second: u32, burst: u32) -> Self {
        let mut buckets = HashMap::new();
        for provider in registry().all() {
            buckets.insert(
                provider.name().to_string(),
                TokenBucket::new(rate_per_second, burst),
            );
        }
        Self {
            buckets,
            fallback: TokenBucket::new(rate_per_second, burst),
        }
    }

    fn bucket(&self, provider_name: &str) -> &TokenBucket {
        self.buckets.get(provider_name).unwrap_or(&self.fallback)
    }

    /// Wait for a probe token for the named provider.
    pub async fn acquire(&self, provider_name: &str) {
        self.bucket(provider_name).acquire().await;
    }

    pub fn try_acquire(&self, provider_name: &str) -> bool {
        self.bucket(provider_name).try_acquire()
    }
}
