//! Shared fixtures for the integration tests

#![allow(dead_code)]

use odds_ripple::config::Config;
use odds_ripple::model::Item;
use odds_ripple::output::{Emitter, OutputResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One game row on a generated odds page
pub struct GameRow {
    pub league: &'static str,
    pub away: &'static str,
    pub home: &'static str,
    pub start: Option<&'static str>,
}

impl GameRow {
    pub fn new(league: &'static str, away: &'static str, home: &'static str) -> Self {
        Self {
            league,
            away,
            home,
            start: Some("2024-03-01T19:00:00Z"),
        }
    }

    pub fn without_date(mut self) -> Self {
        self.start = None;
        self
    }

    fn render(&self) -> String {
        let time = self
            .start
            .map(|t| format!(r#"<time datetime="{}">{}</time>"#, t, t))
            .unwrap_or_default();
        format!(
            r##"<div class="col col-md"><table>
<tr><td><a href="/betting-trends?f={league}">{league}</a>{time}</td><td><span class="text-muted">ML</span></td><td><span class="text-muted">SPREAD</span></td><td><span class="text-muted">TOTAL</span></td></tr>
<tr><td><a class="text-muted" href="#">{away}</a></td><td><span class="text-muted">+115</span></td><td><span class="text-muted">+1.5 (-190)</span></td><td><span class="text-muted">O 8.5 (-110)</span></td></tr>
<tr><td><a class="text-muted" href="#">{home}</a></td><td><span class="text-muted">-135</span></td><td><span class="text-muted">-1.5 (+160)</span></td><td><span class="text-muted">U 8.5 (-110)</span></td></tr>
</table></div>"##,
            league = self.league,
            time = time,
            away = self.away,
            home = self.home,
        )
    }
}

/// Renders a full odds page around `rows`
pub fn odds_page(rows: &[GameRow]) -> String {
    let body: String = rows.iter().map(GameRow::render).collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Odds</title></head><body>
<input id="datepicker" value="">
<div class="row justify-content-md-center">{}</div>
</body></html>"#,
        body
    )
}

/// Configuration pointing at a mock server with fast retries
pub fn test_config(base_url: &str, max_retries: u32) -> Config {
    Config {
        base_url: base_url.to_string(),
        scrape_interval: 1,
        max_retries,
        fetch_timeout: 5,
        retry_delay_ms: 10,
        retry_max_delay_ms: 50,
        output_path: None,
        user_agent: "OddsRippleTest/1.0".to_string(),
    }
}

/// Keeps every emitted batch
#[derive(Default)]
pub struct RecordingEmitter {
    batches: Mutex<Vec<Vec<Item>>>,
}

impl RecordingEmitter {
    pub fn batches(&self) -> Vec<Vec<Item>> {
        self.batches.lock().unwrap().clone()
    }
}

impl Emitter for RecordingEmitter {
    fn emit(&self, items: &[Item]) -> OutputResult<()> {
        self.batches.lock().unwrap().push(items.to_vec());
        Ok(())
    }
}

/// Counts ERROR events emitted by this crate
#[derive(Clone, Default)]
pub struct ErrorCounter {
    count: Arc<AtomicUsize>,
}

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::ERROR && metadata.target().starts_with("odds_ripple") {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
