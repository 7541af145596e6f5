// # HTTP Fetcher
//
// This crate provides the reqwest-based HttpFetcher for the dyndns client.
//
// ## Purpose
//
// The updater issues two kinds of GET requests through this fetcher:
// - The public IP echo request (e.g. checkip.dyndns.org)
// - The provider update request (credentials in the URL user-info)
//
// ## Transport
//
// With the `tls` feature (default) reqwest is built with rustls and update
// URLs use https. Without it only plain http is available.
//
// Credentials embedded in the URL are sent by reqwest as HTTP basic auth
// and must never be logged, so only the host is traced.

use std::time::Duration;

use dyndns_core::{Error, HttpFetcher, Result};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// reqwest-backed implementation of [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    /// HTTP client
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Vec<u8>> {
        let url = reqwest::Url::parse(url)?;
        tracing::trace!(host = url.host_str().unwrap_or_default(), "HTTP GET");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("HTTP error: {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e.without_url())))?;

        tracing::trace!(status = %status, bytes = body.len(), "HTTP response");
        Ok(body.to_vec())
    }
}
