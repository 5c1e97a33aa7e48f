//! Bounded retry with linear backoff.
//!
//! Failures are split into retryable and fatal through [`Classify`]. A
//! retryable failure is retried until the budget is spent; a fatal one stops
//! the loop on the spot.

use crate::config::Config;
use crate::FetchError;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Splits errors into transient faults and faults that retrying cannot fix
pub trait Classify {
    fn is_retryable(&self) -> bool;
}

impl Classify for FetchError {
    fn is_retryable(&self) -> bool {
        FetchError::is_retryable(self)
    }
}

/// Why [`RetryPolicy::execute`] gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last_error: E },

    /// A fatal error; no further attempts were made
    Fatal(E),
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Fatal(_) => 1,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
            Self::Fatal(e) => e,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts: {}", attempts, last_error),
            Self::Fatal(e) => write!(f, "fatal: {}", e),
        }
    }
}

/// Retry budget and backoff curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Added to the delay for every further retry
    pub step: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            step: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Builds the fetch policy from the process configuration
    pub fn from_config(config: &Config) -> Self {
        let initial_delay = Duration::from_millis(config.retry_delay_ms);
        Self {
            max_retries: config.max_retries,
            initial_delay,
            step: initial_delay,
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// A policy that retries immediately; used by tests
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            step: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let delay = self.initial_delay.saturating_add(self.step.saturating_mul(retry));
        delay.min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails fatally, or the budget runs out
    pub async fn execute<T, E, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let total = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    return Err(RetryError::Fatal(e));
                }
                Err(e) if attempt >= total => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let delay = self.delay_for_retry(attempt - 1);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name, attempt, total, e, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
