//! Integration tests for the polling loop
//!
//! The loop runs against a wiremock server with a one second interval and is
//! stopped through its shutdown signal.

mod common;

use common::{odds_page, test_config, GameRow};
use odds_ripple::model::Item;
use odds_ripple::output::{Emitter, OutputResult};
use odds_ripple::scraper::{poll, HttpFetcher, Scheduler, ScrapeCycle, SchedulerReport};
use odds_ripple::state::SchedulerState;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_fetcher() -> HttpFetcher {
    HttpFetcher::new("OddsRippleTest/1.0", Duration::from_secs(5)).expect("client builds")
}

/// Counts emitted batches and raises the stop signal after `stop_after` of them
struct StoppingEmitter {
    emits: Mutex<usize>,
    stop_after: usize,
    stop: watch::Sender<bool>,
}

impl StoppingEmitter {
    fn new(stop_after: usize, stop: watch::Sender<bool>) -> Self {
        Self {
            emits: Mutex::new(0),
            stop_after,
            stop,
        }
    }

    fn emits(&self) -> usize {
        *self.emits.lock().unwrap()
    }
}

impl Emitter for StoppingEmitter {
    fn emit(&self, _items: &[Item]) -> OutputResult<()> {
        let mut emits = self.emits.lock().unwrap();
        *emits += 1;
        if *emits >= self.stop_after {
            let _ = self.stop.send(true);
        }
        Ok(())
    }
}

fn page_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(odds_page(&[
        GameRow::new("nba", "Heat", "Bulls"),
        GameRow::new("nhl", "Bruins", "Rangers"),
    ]))
}

/// Mounts responses so requests succeed, fail, then succeed again
async fn mount_success_failure_success(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(page_response())
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .respond_with(page_response())
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_poll_emits_only_successful_cycles() {
    let mock_server = MockServer::start().await;
    mount_success_failure_success(&mock_server).await;

    let (stop_tx, stop_rx) = watch::channel(false);
    let emitter = Arc::new(StoppingEmitter::new(2, stop_tx));
    let config = test_config(&mock_server.uri(), 0);

    let start = Instant::now();
    let report = poll(&config, http_fetcher(), emitter.clone(), stop_rx)
        .await
        .unwrap();

    assert_eq!(
        report,
        SchedulerReport {
            cycles: 3,
            succeeded: 2,
            failed: 1
        }
    );
    assert_eq!(emitter.emits(), 2);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
    // Two intervals separate three cycle starts
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_failing_page_never_stops_the_loop() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (stop_tx, stop_rx) = watch::channel(false);
    let emitter = Arc::new(StoppingEmitter::new(1, watch::channel(false).0));
    let config = test_config(&mock_server.uri(), 1);
    let cycle = ScrapeCycle::from_config(&config, http_fetcher(), emitter.clone()).unwrap();
    let mut scheduler = Scheduler::new(cycle, Duration::from_secs(1));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let _ = stop_tx.send(true);
    });

    let report = scheduler.run(stop_rx).await.unwrap();

    assert!(report.cycles >= 2);
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, report.cycles);
    assert_eq!(emitter.emits(), 0);
    assert_eq!(scheduler.state(), SchedulerState::Stopped);

    // Each failed cycle made the initial attempt plus one retry
    let requests = mock_server.received_requests().await.unwrap().len() as u64;
    assert_eq!(requests, report.cycles * 2);
}

#[tokio::test]
async fn test_stop_before_start_fetches_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page_response())
        .expect(0)
        .mount(&mock_server)
        .await;

    let (_stop_tx, stop_rx) = watch::channel(true);
    let emitter = Arc::new(StoppingEmitter::new(1, watch::channel(false).0));
    let config = test_config(&mock_server.uri(), 0);

    let report = poll(&config, http_fetcher(), emitter.clone(), stop_rx)
        .await
        .unwrap();

    assert_eq!(report, SchedulerReport::default());
    assert_eq!(emitter.emits(), 0);
}
