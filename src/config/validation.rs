use crate::config::types::{Config, FLOOR_SCRAPE_INTERVAL, MIN_SCRAPE_INTERVAL};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;
    validate_timing(config)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &config.output_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "output_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Raises an interval below the politeness minimum, returning true if it did
pub fn apply_interval_floor(config: &mut Config) -> bool {
    if config.scrape_interval < MIN_SCRAPE_INTERVAL {
        tracing::warn!(
            "scrape_interval of {}s is too low, using {}s",
            config.scrape_interval,
            FLOOR_SCRAPE_INTERVAL
        );
        config.scrape_interval = FLOOR_SCRAPE_INTERVAL;
        return true;
    }
    false
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            base_url
        )));
    }

    Ok(())
}

fn validate_timing(config: &Config) -> Result<(), ConfigError> {
    if config.scrape_interval == 0 {
        return Err(ConfigError::Validation(
            "scrape_interval must be a positive number of seconds".to_string(),
        ));
    }

    if config.fetch_timeout == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout must be a positive number of seconds".to_string(),
        ));
    }

    if config.retry_delay_ms > config.retry_max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry_delay_ms ({}) cannot exceed retry_max_delay_ms ({})",
            config.retry_delay_ms, config.retry_max_delay_ms
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::default_user_agent;

    fn valid_config() -> Config {
        Config {
            base_url: "https://www.veri.bet/odds-picks?filter=upcoming".to_string(),
            scrape_interval: 60,
            max_retries: 3,
            fetch_timeout: 30,
            retry_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
            output_path: None,
            user_agent: default_user_agent(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("https://example.com/").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080/odds").is_ok());

        assert!(validate_base_url("").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("ftp://example.com/").is_err());
        assert!(validate_base_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = valid_config();
        config.scrape_interval = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_retries_allowed() {
        let mut config = valid_config();
        config.max_retries = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_retry_delays_ordered() {
        let mut config = valid_config();
        config.retry_delay_ms = 20_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_interval_floor() {
        let mut config = valid_config();
        config.scrape_interval = 2;
        assert!(apply_interval_floor(&mut config));
        assert_eq!(config.scrape_interval, FLOOR_SCRAPE_INTERVAL);

        let mut config = valid_config();
        config.scrape_interval = MIN_SCRAPE_INTERVAL;
        assert!(!apply_interval_floor(&mut config));
        assert_eq!(config.scrape_interval, MIN_SCRAPE_INTERVAL);
    }
}
