use serde::{Deserialize, Serialize};

/// Default seconds between cycle starts
pub const DEFAULT_SCRAPE_INTERVAL: u64 = 60;

/// Default retry budget per fetch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT: u64 = 30;

/// Intervals below this many seconds are raised to [`FLOOR_SCRAPE_INTERVAL`]
pub const MIN_SCRAPE_INTERVAL: u64 = 5;

/// Interval used when the configured one is below [`MIN_SCRAPE_INTERVAL`]
pub const FLOOR_SCRAPE_INTERVAL: u64 = 10;

/// Effective configuration, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Page to poll
    pub base_url: String,

    /// Seconds between cycle starts
    pub scrape_interval: u64,

    /// Retries after the first failed fetch attempt
    pub max_retries: u32,

    /// Bound on a single fetch attempt, in seconds
    pub fetch_timeout: u64,

    /// Delay before the first retry (milliseconds)
    pub retry_delay_ms: u64,

    /// Upper bound on any retry delay (milliseconds)
    pub retry_max_delay_ms: u64,

    /// Optional file that receives each cycle's JSON
    pub output_path: Option<String>,

    /// User agent sent by the HTTP fetcher
    pub user_agent: String,
}

/// On-disk TOML layout; every key is optional and env vars take precedence
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    #[serde(rename = "scrape-interval")]
    pub scrape_interval: Option<u64>,

    #[serde(rename = "max-retries")]
    pub max_retries: Option<u32>,

    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: Option<u64>,

    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: Option<u64>,

    #[serde(rename = "retry-max-delay-ms")]
    pub retry_max_delay_ms: Option<u64>,

    #[serde(rename = "output-path")]
    pub output_path: Option<String>,

    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

pub(crate) fn default_user_agent() -> String {
    format!("OddsRipple/{}", env!("CARGO_PKG_VERSION"))
}
