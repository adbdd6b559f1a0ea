use async_trait::async_trait;
use curl::easy::{Easy2, Handler, WriteError};
use serde_json::Value;
use std::time::Duration;

use crate::core::error::{KeyhoundError, Result};
use crate::providers::{ProbeMethod, ProbeRequest};

/// Collector for response data
struct Collector(Vec<u8>);

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        self.0.extend_from_slice(data);
        Ok(data.len())
    }
}

#[derive(Debug)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    /// Parse the body as JSON, or None when it is empty or malformed.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Transport seam for liveness probes. Production uses libcurl; tests swap
/// in deterministic fakes.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn execute(&self, request: ProbeRequest, timeout: Duration) -> Result<ProbeResponse>;
}

/// HTTP transport using libcurl, run on the blocking pool (curl is sync).
pub struct CurlTransport;

impl CurlTransport {
    pub fn new() -> Self {
        Self
    }

    fn perform(request: &ProbeRequest, timeout: Duration) -> Result<ProbeResponse> {
        let mut easy = Easy2::new(Collector(Vec::new()));

        easy.url(&request.url)?;
        easy.timeout(timeout)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.ssl_verify_peer(true)?;
        easy.ssl_verify_host(true)?;

        if request.method == ProbeMethod::Post {
            easy.post(true)?;
            easy.post_fields_copy(request.body.as_deref().unwrap_or("").as_bytes())?;
        }

        let mut list = curl::easy::List::new();
        for (key, value) in &request.headers {
            list.append(&format!("{}: {}", key, value))?;
        }
        easy.http_headers(list)?;

        easy.perform()?;

        let response_code = easy.response_code()?;
        let body = easy.get_ref().0.clone();

        Ok(ProbeResponse {
            status: response_code as u16,
            body,
        })
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeTransport for CurlTransport {
    async fn execute(&self, request: ProbeRequest, timeout: Duration) -> Result<ProbeResponse> {
        tokio::task::spawn_blocking(move || Self::perform(&request, timeout))
            .await
            .map_err(|e| KeyhoundError::Unknown(format!("Task join error: {}", e)))?
    }
}
