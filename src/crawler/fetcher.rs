//! HTTP fetcher implementation
//!
//! This module handles the primary page fetch for a crawl request:
//! - Building the shared HTTP client with a user agent and timeouts
//! - Rejecting malformed targets before any network call
//! - A single GET per attempt; retries are never performed here
//! - Classifying failures into timeout, transport and status errors

use crate::config::FetcherConfig;
use crate::url::validate_target_url;
use crate::AnalyzerError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Upper bound on connection setup, independent of the overall timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the raw body of a page
///
/// The worker only depends on this trait, so tests can substitute a stub.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the fully buffered response body
    ///
    /// # Errors
    ///
    /// * `AnalyzerError::InvalidUrl` - malformed target, nothing was sent
    /// * `AnalyzerError::Timeout` / `AnalyzerError::Fetch` - transport failure
    /// * `AnalyzerError::UnexpectedStatus` - the server answered outside 2xx
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AnalyzerError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use url_analyzer::config::FetcherConfig;
/// use url_analyzer::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AnalyzerError> {
        let target = validate_target_url(url)?;

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::UnexpectedStatus {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> AnalyzerError {
    if error.is_timeout() {
        AnalyzerError::Timeout {
            url: url.to_string(),
        }
    } else {
        AnalyzerError::Fetch {
            url: url.to_string(),
            source: error,
        }
    }
}
