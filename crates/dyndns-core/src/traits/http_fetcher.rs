// # HTTP Fetcher Trait
//
// Defines the download facility used for both the public IP echo request
// and the provider update request.
//
// ## Implementations
//
// - reqwest-based: `dyndns-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::HttpFetcher;
//
// let body = fetcher.fetch("http://checkip.dyndns.org", "dyndns/0.1.0").await?;
// ```

use async_trait::async_trait;

/// Trait for HTTP download implementations
///
/// A fetch either yields the full response body or an error describing why
/// the request could not be completed. Non-success HTTP statuses are
/// reported as errors.
///
/// # Constraints
///
/// - One request per call, no retries (the updater's timer is the retry)
/// - No knowledge of what is being fetched
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issue a GET request for `url` with the given user agent
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<u8>)`: The response body
    /// - `Err(Error)`: Transport failure or non-success status
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Vec<u8>, crate::Error>;
}
