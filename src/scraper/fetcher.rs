//! Page fetchers
//!
//! This module defines the `PageFetcher` seam used by the scrape cycle and a
//! plain HTTP implementation built on reqwest. The headless browser
//! implementation lives in `browser.rs`.
//!
//! Error classification:
//!
//! | Condition | Error | Retried |
//! |-----------|-------|---------|
//! | Request timeout | `Timeout` | yes |
//! | Connection refused, DNS, TLS, body read | `Navigation` | yes |
//! | Non-2xx status | `Status` | yes |
//! | Client construction | `Setup` | no |

use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Source of rendered page content
///
/// Implementations own their session (HTTP client, browser process) for the
/// whole run and are reused across cycles.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns its rendered HTML
    async fn fetch(&self, url: &Url) -> FetchResult<String>;

    /// Releases the underlying session
    async fn close(&mut self) -> FetchResult<()> {
        Ok(())
    }
}

/// Fetches pages over plain HTTP without running scripts
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Builds a fetcher with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the User-Agent header
    /// * `timeout` - Bound on a whole request
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to use
    /// * `Err(FetchError::Setup)` - The client could not be built
    pub fn new(user_agent: &str, timeout: Duration) -> FetchResult<Self> {
        let client = build_http_client(user_agent, timeout)
            .map_err(|e| FetchError::Setup(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

/// Builds an HTTP client with proper configuration
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, self.timeout, e))
    }
}

fn classify_reqwest_error(url: &Url, timeout: Duration, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            seconds: timeout.as_secs(),
        }
    } else if e.is_connect() {
        FetchError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
