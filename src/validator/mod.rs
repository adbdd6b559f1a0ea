pub mod client;
pub mod rate_limiter;
pub mod transport;

pub use client::ValidationClient;
pub use rate_limiter::{ProviderLimits, TokenBucket};
pub use transport::{CurlTransport, ProbeResponse, ProbeTransport};
