//! Odds-Ripple main entry point
//!
//! This is the command-line interface for the Odds-Ripple odds poller.

use clap::Parser;
use odds_ripple::config::{load_config_with_hash, Config};
use odds_ripple::output::{FanoutEmitter, JsonEmitter, JsonFileEmitter};
use odds_ripple::scraper::{poll, relay_interrupts, HttpFetcher, PageFetcher, ScrapeCycle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Exit status after a forced stop (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Odds-Ripple: a polling odds scraper
///
/// Odds-Ripple loads the configured odds page on a fixed interval, extracts
/// the betting lines, and prints each cycle's lines as a JSON array.
#[derive(Parser, Debug)]
#[command(name = "odds-ripple")]
#[command(version)]
#[command(about = "A polling odds scraper", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Also write each cycle's JSON to this file (overrides OUTPUT_PATH)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single cycle and exit
    #[arg(long, conflicts_with = "dry_run")]
    once: bool,

    /// Validate config and show what would be polled without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Fetch over plain HTTP instead of the headless browser
    #[arg(long)]
    http: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let (mut config, config_hash) = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(path) = &cli.output {
        config.output_path = Some(path.display().to_string());
    }

    if cli.dry_run {
        handle_dry_run(&config, &config_hash, cli.http);
        return Ok(());
    }

    if cli.http || !cfg!(feature = "browser") {
        let fetcher = HttpFetcher::new(&config.user_agent, Duration::from_secs(config.fetch_timeout))?;
        run_with(fetcher, config, cli.once).await
    } else {
        run_with_browser(config, cli.once).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("odds_ripple=info,warn"),
            1 => EnvFilter::new("odds_ripple=debug,info"),
            2 => EnvFilter::new("odds_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout carries only JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str, http: bool) {
    println!("=== Odds-Ripple Dry Run ===\n");

    println!("Target:");
    println!("  URL: {}", config.base_url);
    println!(
        "  Fetcher: {}",
        if http || !cfg!(feature = "browser") {
            "http"
        } else {
            "headless browser"
        }
    );
    println!("  User agent: {}", config.user_agent);

    println!("\nTiming:");
    println!("  Scrape interval: {}s", config.scrape_interval);
    println!("  Fetch timeout: {}s", config.fetch_timeout);
    println!(
        "  Retries: {} (delay {}ms, max {}ms)",
        config.max_retries, config.retry_delay_ms, config.retry_max_delay_ms
    );

    println!("\nOutput:");
    println!("  stdout: JSON array per cycle");
    match &config.output_path {
        Some(path) => println!("  File: {}", path),
        None => println!("  File: (none)"),
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

#[cfg(feature = "browser")]
async fn run_with_browser(config: Config, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    use odds_ripple::scraper::{BrowserFetcher, BrowserOptions, RetryPolicy};

    let launch_policy = RetryPolicy::from_config(&config);
    let fetcher = BrowserFetcher::launch_with_retry(&BrowserOptions::default(), &launch_policy).await?;
    run_with(fetcher, config, once).await
}

#[cfg(not(feature = "browser"))]
async fn run_with_browser(config: Config, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::new(&config.user_agent, Duration::from_secs(config.fetch_timeout))?;
    run_with(fetcher, config, once).await
}

fn build_emitter(config: &Config) -> FanoutEmitter {
    let mut emitter = FanoutEmitter::new().with(JsonEmitter::stdout());
    if let Some(path) = &config.output_path {
        emitter = emitter.with(JsonFileEmitter::new(path));
    }
    emitter
}

/// Runs either one cycle or the polling loop, then releases the fetcher
async fn run_with<F: PageFetcher>(
    fetcher: F,
    config: Config,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let emitter = build_emitter(&config);

    if once {
        return handle_once(fetcher, &config, emitter).await;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if relay_interrupts(tokio::signal::ctrl_c, shutdown_tx).await {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    match poll(&config, fetcher, emitter, shutdown_rx).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("Polling stopped: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the --once mode: a single cycle, exit status reflects its outcome
async fn handle_once<F: PageFetcher>(
    fetcher: F,
    config: &Config,
    emitter: FanoutEmitter,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cycle = ScrapeCycle::from_config(config, fetcher, emitter)?;
    let outcome = cycle.run_once().await;

    let mut fetcher = cycle.into_fetcher();
    if let Err(e) = fetcher.close().await {
        tracing::warn!("Failed to close fetcher session: {}", e);
    }

    let result = outcome?;
    if !result.status.is_success() {
        return Err(format!("cycle {}", result.status).into());
    }
    Ok(())
}
