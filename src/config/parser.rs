use crate::config::types::{
    default_user_agent, Config, FileConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES,
    DEFAULT_SCRAPE_INTERVAL,
};
use crate::config::validation::{apply_interval_floor, validate};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable naming the page to poll
pub const ENV_BASE_URL: &str = "BASE_URL";
/// Environment variable with the interval in seconds
pub const ENV_SCRAPE_INTERVAL: &str = "SCRAPE_INTERVAL";
/// Environment variable with the retry budget
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
/// Environment variable with the per-attempt fetch timeout in seconds
pub const ENV_FETCH_TIMEOUT: &str = "FETCH_TIMEOUT";
/// Environment variable with the JSON output file path
pub const ENV_OUTPUT_PATH: &str = "OUTPUT_PATH";

/// Loads the configuration from an optional TOML file and the process environment
///
/// A `.env` file in the working directory is read first (missing is fine).
/// Environment variables override values from the file.
///
/// # Arguments
///
/// * `path` - Optional path to a TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use odds_ripple::config::load_config;
///
/// let config = load_config(None).unwrap();
/// println!("Polling {} every {}s", config.base_url, config.scrape_interval);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Ok(env_path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", env_path.display());
    }

    let file = match path {
        Some(path) => read_config_file(path)?,
        None => FileConfig::default(),
    };

    resolve(file, |key| std::env::var(key).ok())
}

/// Reads and parses a TOML configuration file
pub fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merges file settings with environment lookups and validates the result
///
/// `env` is consulted for each supported variable; a `Some` value wins over
/// the file. Blank values are treated as unset.
pub fn resolve<F>(file: FileConfig, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let env = |key: &'static str| env(key).filter(|v| !v.trim().is_empty());

    let base_url = env(ENV_BASE_URL)
        .or(file.base_url)
        .ok_or(ConfigError::Missing(ENV_BASE_URL))?;

    let scrape_interval = match env(ENV_SCRAPE_INTERVAL) {
        Some(raw) => parse_integer(ENV_SCRAPE_INTERVAL, &raw)?,
        None => file.scrape_interval.unwrap_or(DEFAULT_SCRAPE_INTERVAL),
    };

    let max_retries = match env(ENV_MAX_RETRIES) {
        Some(raw) => parse_integer(ENV_MAX_RETRIES, &raw)?,
        None => file.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
    };

    let fetch_timeout = match env(ENV_FETCH_TIMEOUT) {
        Some(raw) => parse_integer(ENV_FETCH_TIMEOUT, &raw)?,
        None => file.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT),
    };

    let mut config = Config {
        base_url: base_url.trim().to_string(),
        scrape_interval,
        max_retries,
        fetch_timeout,
        retry_delay_ms: file.retry_delay_ms.unwrap_or(1_000),
        retry_max_delay_ms: file.retry_max_delay_ms.unwrap_or(10_000),
        output_path: env(ENV_OUTPUT_PATH).or(file.output_path),
        user_agent: file.user_agent.unwrap_or_else(default_user_agent),
    };

    validate(&config)?;
    apply_interval_floor(&mut config);

    Ok(config)
}

fn parse_integer<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::NotAnInteger {
        key,
        value: raw.to_string(),
    })
}

/// Computes a SHA-256 hash of the effective configuration
///
/// Logged at startup so operators can tell which settings a run used.
pub fn compute_config_hash(config: &Config) -> String {
    let rendered = serde_json::to_string(config).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(&config);
    Ok((config, hash))
}
