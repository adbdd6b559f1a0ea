pub mod entropy;
pub mod redaction;

pub use entropy::{is_high_entropy, shannon_entropy};
pub use redaction::{redact, redact_default, redact_in_text};
