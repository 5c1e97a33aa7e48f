//! Scraper module for polling the odds page
//!
//! This module contains the core polling logic, including:
//! - Page fetching over HTTP or through a headless browser
//! - Odds page parsing into items
//! - Bounded retry with backoff around every fetch
//! - The fetch-parse-emit cycle and the fixed-interval scheduler

#[cfg(feature = "browser")]
mod browser;
mod cycle;
mod fetcher;
mod parser;
mod retry;
mod scheduler;

#[cfg(feature = "browser")]
pub use browser::{BrowserFetcher, BrowserOptions};
pub use cycle::{CycleResult, ScrapeCycle};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use parser::{extract_point, extract_price, RecordParser, CONTAINER_SELECTOR, DEFAULT_PERIOD};
pub use retry::{Classify, RetryError, RetryPolicy};
pub use scheduler::{Scheduler, SchedulerReport};

use crate::config::Config;
use crate::output::Emitter;
use crate::OddsError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Polls the configured page until `shutdown` carries `true`
///
/// This is the main entry point for a polling run. It will:
/// 1. Build the scrape cycle around `fetcher` and `emitter`
/// 2. Run it every `scrape_interval` seconds
/// 3. Close the fetcher's session once the loop ends, whatever the outcome
///
/// # Returns
///
/// * `Ok(SchedulerReport)` - Stopped by the signal
/// * `Err(OddsError)` - Configuration was unusable or a cycle failed fatally
pub async fn poll<F, E>(
    config: &Config,
    fetcher: F,
    emitter: E,
    shutdown: watch::Receiver<bool>,
) -> Result<SchedulerReport, OddsError>
where
    F: PageFetcher,
    E: Emitter,
{
    let cycle = ScrapeCycle::from_config(config, fetcher, emitter)?;
    let mut scheduler = Scheduler::new(cycle, Duration::from_secs(config.scrape_interval));

    let outcome = scheduler.run(shutdown).await;

    let mut fetcher = scheduler.into_cycle().into_fetcher();
    if let Err(e) = fetcher.close().await {
        tracing::warn!("Failed to close fetcher session: {}", e);
    }

    outcome
}

/// Turns interrupts into a graceful stop, then a forced one
///
/// The first interrupt raises `shutdown` so the loop ends after the current
/// cycle. Returns true once a second interrupt arrives, in which case the
/// caller should exit without waiting; returns false if listening failed.
pub async fn relay_interrupts<F, Fut>(mut interrupt: F, shutdown: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        tracing::warn!("Cannot listen for interrupts: {}", e);
        return false;
    }
    tracing::info!("Interrupt received, stopping after the current cycle (again to exit now)");
    let _ = shutdown.send(true);

    match interrupt().await {
        Ok(()) => {
            tracing::warn!("Second interrupt received, exiting immediately");
            true
        }
        Err(e) => {
            tracing::warn!("Cannot listen for interrupts: {}", e);
            false
        }
    }
}
