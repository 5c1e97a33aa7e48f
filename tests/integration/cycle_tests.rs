//! Integration tests for a single scrape cycle
//!
//! These tests use wiremock to serve odds pages and drive the HTTP fetcher,
//! parser, retry policy and emitter together.

mod common;

use common::{odds_page, test_config, ErrorCounter, GameRow, RecordingEmitter};
use odds_ripple::model::{EventDate, UNKNOWN_LEAGUE};
use odds_ripple::output::JsonFileEmitter;
use odds_ripple::scraper::{HttpFetcher, ScrapeCycle};
use odds_ripple::state::CycleStatus;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_fetcher() -> HttpFetcher {
    HttpFetcher::new("OddsRippleTest/1.0", Duration::from_secs(5)).expect("client builds")
}

#[tokio::test]
async fn test_three_rows_emit_three_items() {
    let mock_server = MockServer::start().await;

    let page = odds_page(&[
        GameRow::new("mlb", "Yankees", "Red Sox"),
        GameRow::new("nba", "Lakers", "Celtics"),
        GameRow::new("nhl", "Oilers", "Flames"),
    ]);
    Mock::given(method("GET"))
        .and(path("/odds"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/odds", mock_server.uri()), 3);
    let emitter = Arc::new(RecordingEmitter::default());
    let mut cycle = ScrapeCycle::from_config(&config, http_fetcher(), emitter.clone()).unwrap();

    let result = cycle.run_once().await.unwrap();

    assert_eq!(result.status, CycleStatus::Succeeded);
    let batches = emitter.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
    assert_eq!(batches[0], result.items);

    let leagues: Vec<&str> = batches[0].iter().map(|i| i.league()).collect();
    assert_eq!(leagues, vec!["MLB", "NBA", "NHL"]);
    for item in &batches[0] {
        assert_ne!(item.league(), UNKNOWN_LEAGUE);
        assert!(!item.away_team().is_empty());
        assert!(!item.home_team().is_empty());
        assert_eq!(item.lines().len(), 6);
    }
}

#[tokio::test]
async fn test_exhausted_retries_fail_cycle_with_one_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let errors = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(errors.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let config = test_config(&format!("{}/odds", mock_server.uri()), 3);
    let emitter = Arc::new(RecordingEmitter::default());
    let mut cycle = ScrapeCycle::from_config(&config, http_fetcher(), emitter.clone()).unwrap();

    let result = cycle.run_once().await.unwrap();

    assert_eq!(result.status, CycleStatus::Failed);
    assert!(result.items.is_empty());
    assert_eq!(result.attempts, 4);
    assert!(emitter.batches().is_empty());
    assert_eq!(errors.count(), 1);

    // Initial attempt plus three retries
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(odds_page(&[GameRow::new(
                "nfl", "Packers", "Bears",
            )])),
        )
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), 3);
    let emitter = Arc::new(RecordingEmitter::default());
    let mut cycle = ScrapeCycle::from_config(&config, http_fetcher(), emitter.clone()).unwrap();

    let result = cycle.run_once().await.unwrap();

    assert_eq!(result.status, CycleStatus::Succeeded);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.attempts, 3);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_event_date_becomes_unknown() {
    let mock_server = MockServer::start().await;

    let page = odds_page(&[
        GameRow::new("nba", "Suns", "Nuggets"),
        GameRow::new("nba", "Jazz", "Kings").without_date(),
    ]);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), 0);
    let emitter = Arc::new(RecordingEmitter::default());
    let mut cycle = ScrapeCycle::from_config(&config, http_fetcher(), emitter.clone()).unwrap();

    let result = cycle.run_once().await.unwrap();

    assert_eq!(result.status, CycleStatus::Succeeded);
    assert_eq!(result.items.len(), 2);
    assert!(result.items[0].event_date().is_known());
    assert_eq!(result.items[1].event_date(), EventDate::Unknown);
}

#[tokio::test]
async fn test_non_odds_page_fails_cycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Checking your browser</h1></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), 3);
    let emitter = Arc::new(RecordingEmitter::default());
    let mut cycle = ScrapeCycle::from_config(&config, http_fetcher(), emitter.clone()).unwrap();

    let result = cycle.run_once().await.unwrap();

    assert_eq!(result.status, CycleStatus::Failed);
    assert!(emitter.batches().is_empty());
    // A parse failure is not retried
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_emitter_receives_json_array() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("betting_data.json");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(odds_page(&[
            GameRow::new("soccer", "Arsenal", "Chelsea"),
            GameRow::new("mlb", "Mets", "Braves"),
        ])))
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server.uri(), 0);
    let mut cycle =
        ScrapeCycle::from_config(&config, http_fetcher(), JsonFileEmitter::new(&output)).unwrap();

    let result = cycle.run_once().await.unwrap();
    assert_eq!(result.status, CycleStatus::Succeeded);

    let content = std::fs::read_to_string(&output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array[0]["league"], "SOCCER");
    assert_eq!(array[0]["away_team"], "Arsenal");
    assert_eq!(array[0]["home_team"], "Chelsea");
    assert_eq!(array[0]["event_date"], "2024-03-01T19:00:00Z");
    assert!(array[0]["scraped_at"].is_string());
    assert_eq!(array[1]["lines"][0]["market"], "moneyline");
}
