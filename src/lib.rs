//! Odds-Ripple: a polling odds scraper
//!
//! This crate fetches a sports-odds page on a fixed interval, parses the
//! betting lines embedded in the rendered HTML, and emits them as JSON.
//! Transient fetch failures are retried with backoff, and a failed cycle
//! never stops the polling loop.

pub mod config;
pub mod model;
pub mod output;
pub mod scraper;
pub mod state;

use thiserror::Error;

/// Main error type for Odds-Ripple operations
#[derive(Debug, Error)]
pub enum OddsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SchedulerState,
        to: state::SchedulerState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}' is not a valid integer")]
    NotAnInteger { key: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while retrieving a page
///
/// Everything except `Setup` is a transient, retryable fault.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {seconds}s loading {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("HTTP {status_code} from {url}")]
    Status { url: String, status_code: u16 },

    #[error("Fetcher setup failed: {0}")]
    Setup(String),
}

impl FetchError {
    /// Returns true if retrying the fetch may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Setup(_))
    }
}

/// Structural parse failures
///
/// Per-record anomalies never surface here; they are logged and replaced by
/// sentinel values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Page content is empty")]
    EmptyContent,

    #[error("Page has no odds container ({selector})")]
    MissingContainer { selector: &'static str },
}

/// Result type alias for Odds-Ripple operations
pub type Result<T> = std::result::Result<T, OddsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{EventDate, Item, Line};
pub use state::{CycleStatus, SchedulerState};
