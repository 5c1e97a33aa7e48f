//! Headless Chrome fetcher using chromiumoxide.

use crate::scraper::fetcher::PageFetcher;
use crate::scraper::retry::{Classify, RetryPolicy};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Launch settings for the headless browser
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Chrome binary; auto-detected when None
    pub executable: Option<PathBuf>,
    /// Extra wait after navigation so client-side scripts can render the odds
    pub settle: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: std::env::var_os("CHROME_PATH").map(PathBuf::from),
            settle: Duration::from_millis(1500),
        }
    }
}

/// Page fetcher backed by one headless Chrome process
///
/// The process is started by [`BrowserFetcher::launch`] and must be shut
/// down with [`PageFetcher::close`].
pub struct BrowserFetcher {
    browser: Browser,
    handle: tokio::task::JoinHandle<()>,
    settle: Duration,
}

#[derive(Debug)]
struct LaunchFailure(String);

impl fmt::Display for LaunchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Classify for LaunchFailure {
    fn is_retryable(&self) -> bool {
        true
    }
}

impl BrowserFetcher {
    /// Launches a new headless browser instance
    pub async fn launch(options: &BrowserOptions) -> FetchResult<Self> {
        Self::try_launch(options)
            .await
            .map_err(|e| FetchError::Setup(e.0))
    }

    /// Launches the browser, retrying transient startup failures
    ///
    /// Gives up with `FetchError::Setup` once `policy` is exhausted.
    pub async fn launch_with_retry(
        options: &BrowserOptions,
        policy: &RetryPolicy,
    ) -> FetchResult<Self> {
        policy
            .execute("browser launch", || Self::try_launch(options))
            .await
            .map_err(|e| FetchError::Setup(e.to_string()))
    }

    async fn try_launch(options: &BrowserOptions) -> Result<Self, LaunchFailure> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .window_size(1920, 1080);
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| LaunchFailure(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| LaunchFailure(format!("Failed to launch browser: {}", e)))?;

        // The handler drives the CDP connection and must keep running
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Headless browser launched");

        Ok(Self {
            browser,
            handle,
            settle: options.settle,
        })
    }
}

/// An open browser tab that can be closed
#[async_trait]
trait Tab: Send + 'static {
    async fn close_tab(self) -> Result<(), String>;
}

#[async_trait]
impl Tab for Page {
    async fn close_tab(self) -> Result<(), String> {
        self.close().await.map_err(|e| e.to_string())
    }
}

/// Closes its tab on `close`, or in the background if dropped first
///
/// A fetch future cancelled by the cycle's per-attempt timeout is dropped
/// mid-navigation; the guard keeps that from leaking the tab.
struct TabGuard<T: Tab> {
    tab: Option<T>,
}

impl<T: Tab> TabGuard<T> {
    fn new(tab: T) -> Self {
        Self { tab: Some(tab) }
    }

    async fn close(mut self) {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close_tab().await {
                tracing::debug!("Failed to close tab: {}", e);
            }
        }
    }
}

impl<T: Tab> Drop for TabGuard<T> {
    fn drop(&mut self) {
        let Some(tab) = self.tab.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = tab.close_tab().await {
                        tracing::debug!("Failed to close abandoned tab: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime to close an abandoned tab"),
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        let navigation = |e: chromiumoxide::error::CdpError| FetchError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let page = self.browser.new_page(url.as_str()).await.map_err(navigation)?;
        let guard = TabGuard::new(page.clone());

        let content = async {
            page.wait_for_navigation().await?;
            tokio::time::sleep(self.settle).await;
            page.content().await
        }
        .await;

        guard.close().await;
        content.map_err(navigation)
    }

    async fn close(&mut self) -> FetchResult<()> {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close returned an error: {}", e);
        }
        self.handle.abort();
        tracing::info!("Headless browser closed");
        Ok(())
    }
}
