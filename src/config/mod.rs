//! Configuration module for Odds-Ripple
//!
//! Settings come from an optional TOML file and the environment (`BASE_URL`,
//! `SCRAPE_INTERVAL`, `MAX_RETRIES`, ...), with the environment taking
//! precedence. They are read once at startup and never change afterwards.
//!
//! # Example
//!
//! ```no_run
//! use odds_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("odds.toml"))).unwrap();
//! println!("Max retries: {}", config.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FileConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_SCRAPE_INTERVAL,
    FLOOR_SCRAPE_INTERVAL, MIN_SCRAPE_INTERVAL,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, read_config_file, resolve,
    ENV_BASE_URL, ENV_FETCH_TIMEOUT, ENV_MAX_RETRIES, ENV_OUTPUT_PATH, ENV_SCRAPE_INTERVAL,
};
pub use validation::validate;
