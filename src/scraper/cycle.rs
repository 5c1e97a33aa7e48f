//! One fetch-parse-emit pass
//!
//! A cycle fetches the odds page through the retry policy, parses it, and
//! hands the items to the emitter. Transient failures end the cycle as
//! `Failed` without publishing anything; only a fatal fetch error escapes as
//! an `Err`.

use crate::config::Config;
use crate::model::Item;
use crate::output::Emitter;
use crate::scraper::fetcher::PageFetcher;
use crate::scraper::parser::RecordParser;
use crate::scraper::retry::{RetryError, RetryPolicy};
use crate::state::CycleStatus;
use crate::{ConfigError, FetchError, OddsError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Outcome of [`ScrapeCycle::run_once`]
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    /// Items handed to the emitter; always empty for failed cycles
    pub items: Vec<Item>,

    pub status: CycleStatus,

    /// Fetch attempts made, including the first
    pub attempts: u32,
}

impl CycleResult {
    fn succeeded(items: Vec<Item>, attempts: u32) -> Self {
        Self {
            items,
            status: CycleStatus::Succeeded,
            attempts,
        }
    }

    fn failed(attempts: u32) -> Self {
        Self {
            items: Vec::new(),
            status: CycleStatus::Failed,
            attempts,
        }
    }
}

/// Runs fetch, parse and emit for a single URL
///
/// The fetcher and emitter are owned for the lifetime of the cycle and
/// reused on every pass.
pub struct ScrapeCycle<F, E> {
    url: Url,
    fetcher: F,
    parser: RecordParser,
    emitter: E,
    retry: RetryPolicy,
    fetch_timeout: Duration,
    cycles_run: u64,
}

impl<F: PageFetcher, E: Emitter> ScrapeCycle<F, E> {
    /// Creates a cycle with a 30 second bound per fetch attempt
    pub fn new(url: Url, fetcher: F, emitter: E, retry: RetryPolicy) -> Self {
        Self {
            url,
            fetcher,
            parser: RecordParser::new(),
            emitter,
            retry,
            fetch_timeout: Duration::from_secs(30),
            cycles_run: 0,
        }
    }

    /// Creates a cycle from the process configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeCycle)` - Ready to run
    /// * `Err(OddsError::Config)` - `base_url` does not parse
    pub fn from_config(config: &Config, fetcher: F, emitter: E) -> Result<Self, OddsError> {
        let url = Url::parse(&config.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e))
        })?;

        Ok(Self::new(url, fetcher, emitter, RetryPolicy::from_config(config))
            .with_fetch_timeout(Duration::from_secs(config.fetch_timeout)))
    }

    /// Sets the bound on a single fetch attempt
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Number of cycles started so far
    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// Consumes the cycle, returning its fetcher so the session can be closed
    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    /// Runs one fetch-parse-emit pass
    ///
    /// # Returns
    ///
    /// * `Ok(CycleResult)` - `Succeeded` with the emitted items, or `Failed` with none
    /// * `Err(OddsError::Fetch)` - The fetcher reported a fatal error
    pub async fn run_once(&mut self) -> Result<CycleResult, OddsError> {
        self.cycles_run += 1;
        let cycle = self.cycles_run;
        let started = Instant::now();
        tracing::info!("Cycle {} started: fetching {}", cycle, self.url);

        let (outcome, attempts) = self.fetch().await;
        let content = match outcome {
            Ok(content) => content,
            Err(RetryError::Fatal(e)) => {
                tracing::error!("Cycle {} aborted: fatal fetch error: {}", cycle, e);
                return Err(e.into());
            }
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => {
                tracing::error!(
                    "Cycle {} failed: fetch gave up after {} attempts: {}",
                    cycle,
                    attempts,
                    last_error
                );
                return Ok(CycleResult::failed(attempts));
            }
        };

        let items = match self.parser.parse(&content) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Cycle {} failed: {}", cycle, e);
                return Ok(CycleResult::failed(attempts));
            }
        };

        if let Err(e) = self.emitter.emit(&items) {
            tracing::error!("Cycle {} failed: could not emit items: {}", cycle, e);
            return Ok(CycleResult::failed(attempts));
        }

        tracing::info!(
            "Cycle {} finished: {} items in {:.2?}",
            cycle,
            items.len(),
            started.elapsed()
        );
        Ok(CycleResult::succeeded(items, attempts))
    }

    /// Fetches the page under the retry policy, bounding every attempt
    ///
    /// Also returns the number of attempts made.
    async fn fetch(&self) -> (Result<String, RetryError<FetchError>>, u32) {
        let url = &self.url;
        let fetcher = &self.fetcher;
        let timeout = self.fetch_timeout;
        let attempts = AtomicU32::new(0);
        let counter = &attempts;

        let outcome = self
            .retry
            .execute("page fetch", || async move {
                counter.fetch_add(1, Ordering::Relaxed);
                match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout {
                        url: url.to_string(),
                        seconds: timeout.as_secs(),
                    }),
                }
            })
            .await;

        (outcome, attempts.load(Ordering::Relaxed))
    }
}
