use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::core::models::ValidationState;

pub mod anthropic;
pub mod cohere;
pub mod google_gemini;
pub mod groq;
pub mod huggingface;
pub mod langsmith;
pub mod openai;
pub mod replicate;

pub use anthropic::AnthropicProvider;
pub use cohere::CohereProvider;
pub use google_gemini::GoogleGeminiProvider;
pub use groq::GroqProvider;
pub use huggingface::HuggingFaceProvider;
pub use langsmith::LangSmithProvider;
pub use openai::OpenAiProvider;
pub use replicate::ReplicateProvider;

/// A named, compiled detection pattern. Capture group 1 is the secret; the
/// full match may span surrounding context for prefixless key formats.
pub struct KeyPattern {
    pub name: &'static str,
    pub regex: Regex,
}

impl KeyPattern {
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            // Patterns are fixed at compile time; a failure here is a
            // programmer error, not a runtime condition.
            regex: Regex::new(pattern).expect("invalid provider pattern"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Post,
}

/// Fully resolved liveness probe: method, final URL (after any
/// query-parameter substitution), headers, and optional body.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, key: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", key))
    }
}

/// Uniform capability set every supported AI provider satisfies: detection
/// patterns, a probe builder, and a response classifier.
pub trait Provider: Send + Sync {
    /// Stable identifier (e.g. "openai").
    fn name(&self) -> &'static str;

    /// Human-readable name (e.g. "OpenAI").
    fn display_name(&self) -> &'static str;

    /// Ordered, non-empty detection patterns.
    fn patterns(&self) -> &[KeyPattern];

    /// URL probed for liveness.
    fn validation_endpoint(&self) -> &'static str;

    /// Build the liveness probe for a key. Must never request anything that
    /// could bill beyond the smallest possible probe.
    fn build_probe_request(&self, key: &str) -> ProbeRequest;

    /// Map an HTTP response to a validation state. Total: handles at least
    /// 200/401/403/429 and maps everything unrecognized (including 5xx) to
    /// `ProbeError`. Never returns `NotAttempted` or `Skipped`.
    fn classify_response(&self, status: u16, body: Option<&Value>) -> ValidationState;
}

/// Read-only, construction-once collection of the supported providers.
/// Registration order is fixed at initialization and drives scanner
/// enumeration order.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl ProviderRegistry {
    fn bootstrap() -> Self {
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(OpenAiProvider::new()),
            Box::new(AnthropicProvider::new()),
            Box::new(HuggingFaceProvider::new()),
            Box::new(CohereProvider::new()),
            Box::new(ReplicateProvider::new()),
            Box::new(GoogleGeminiProvider::new()),
            Box::new(GroqProvider::new()),
            Box::new(LangSmithProvider::new()),
        ];
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Provider> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Zero-based registration index, used for deterministic ordering.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.name() == name)
    }

    /// Providers in registration order.
    pub fn all(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

lazy_static! {
    static ref REGISTRY: ProviderRegistry = ProviderRegistry::bootstrap();
}

/// The process-wide provider registry.
pub fn registry() -> &'static ProviderRegistry {
    &REGISTRY
}
