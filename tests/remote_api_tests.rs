//! Integration tests for the Sonarr and TVmaze clients against a local stub server
//!
//! These tests verify:
//! - Request shapes (endpoints, query strings, JSON bodies, API key header)
//! - Status error mapping
//! - Missing episode analysis and submission end to end
//! - TVmaze premiere year lookup and caching

mod common;

use common::{Route, StubServer, utf8_temp_dir, write_file};
use media_organizer::StateManager;
use media_organizer::models::EpisodeKey;
use media_organizer::services::{
    LibraryManager, MissingEpisodeAnalyzer, ShowDirectory, SonarrClient, SonarrError, TvMazeClient,
};
use std::sync::Arc;
use tokio::sync::watch;

const SERIES: &str = r#"[
    {"id": 1, "title": "Firefly", "year": 2002},
    {"id": 2, "title": "The Expanse", "year": 2015}
]"#;

const FIREFLY_EPISODES: &str = r#"[
    {"id": 11, "seriesId": 1, "seasonNumber": 1, "episodeNumber": 1, "title": "Serenity", "hasFile": true, "monitored": true},
    {"id": 12, "seriesId": 1, "seasonNumber": 1, "episodeNumber": 2, "title": "The Train Job", "hasFile": false, "monitored": false},
    {"id": 13, "seriesId": 1, "seasonNumber": 1, "episodeNumber": 3, "title": "Bushwhacked", "hasFile": false, "monitored": false}
]"#;

fn sonarr_routes() -> Vec<Route> {
    vec![
        Route::new("GET", "/api/v3/series", 200, SERIES),
        Route::new("GET", "/api/v3/episode?seriesId=1", 200, FIREFLY_EPISODES),
        Route::new("GET", "/api/v3/episode?seriesId=2", 200, "[]"),
        Route::new("PUT", "/api/v3/episode/monitor", 202, "[]"),
        Route::new("POST", "/api/v3/command", 201, r#"{"id": 99}"#),
    ]
}

fn client(server: &StubServer) -> SonarrClient {
    SonarrClient::new(&format!("{}/api/v3", server.base_url), "secret-key").unwrap()
}

#[tokio::test]
async fn test_sonarr_list_series_sends_api_key() {
    let server = StubServer::start(sonarr_routes()).await;

    let series = client(&server).list_series().await.unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].title, "Firefly");
    assert_eq!(series[1].year, Some(2015));

    let requests = server.requests_to("GET", "/api/v3/series");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].api_key.as_deref(), Some("secret-key"));
}

#[tokio::test]
async fn test_sonarr_episodes_query_series_id() {
    let server = StubServer::start(sonarr_routes()).await;

    let episodes = client(&server).episodes(1).await.unwrap();

    assert_eq!(episodes.len(), 3);
    assert_eq!(episodes[1].key(), EpisodeKey::new(1, 2));
    assert!(episodes[0].has_file);
    assert_eq!(server.requests()[0].target, "/api/v3/episode?seriesId=1");
}

#[tokio::test]
async fn test_sonarr_monitor_and_search_bodies() {
    let server = StubServer::start(sonarr_routes()).await;
    let client = client(&server);

    client.monitor_episodes(&[12, 13]).await.unwrap();
    client.search_episodes(&[12, 13]).await.unwrap();

    let monitor = &server.requests_to("PUT", "/api/v3/episode/monitor")[0];
    assert_eq!(
        monitor.json(),
        serde_json::json!({"episodeIds": [12, 13], "monitored": true})
    );

    let command = &server.requests_to("POST", "/api/v3/command")[0];
    assert_eq!(
        command.json(),
        serde_json::json!({"name": "EpisodeSearch", "episodeIds": [12, 13]})
    );
}

#[tokio::test]
async fn test_sonarr_error_status() {
    let server = StubServer::start(vec![Route::new("GET", "/api/v3/series", 401, "{}")]).await;

    let result = client(&server).list_series().await;

    assert!(matches!(
        result,
        Err(SonarrError::Status { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_missing_episode_analysis_end_to_end() {
    let server = StubServer::start(sonarr_routes()).await;
    let (_guard, root) = utf8_temp_dir();
    write_file(&root, "Firefly (2002)/Season 01/Firefly S01E01.mkv", b"ep");
    write_file(&root, "Firefly (2002)/Season 01/Firefly S01E01.nfo", b"meta");
    write_file(&root, "The Expanse (2015)/Season 01/The Expanse S01E01.mkv", b"ep");
    write_file(&root, "Unknown Show/Season 01/Unknown Show S01E01.mkv", b"ep");

    let state = StateManager::new();
    let analyzer = MissingEpisodeAnalyzer::new(Arc::new(client(&server)), state.clone());
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let missing = analyzer.analyze(&[root.clone()], &cancel_rx).await.unwrap();

    assert_eq!(missing.len(), 1);
    let firefly = &missing["Firefly"];
    let keys: Vec<EpisodeKey> = firefly.iter().map(|e| e.key).collect();
    assert_eq!(keys, vec![EpisodeKey::new(1, 2), EpisodeKey::new(1, 3)]);
    assert_eq!(firefly[0].to_string(), "S01E02 (The Train Job)");

    let snapshot = state.snapshot();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.processed, 3);

    let submission = analyzer.submit(&missing).await;
    assert_eq!(submission.submitted, 2);
    assert!(submission.failed_series.is_empty());
    assert_eq!(server.requests_to("PUT", "/api/v3/episode/monitor").len(), 1);
    assert_eq!(server.requests_to("POST", "/api/v3/command").len(), 1);
}

#[tokio::test]
async fn test_analysis_skips_series_when_series_list_unavailable() {
    let server = StubServer::start(vec![Route::new("GET", "/api/v3/series", 500, "{}")]).await;
    let (_guard, root) = utf8_temp_dir();
    write_file(&root, "Firefly/Season 01/Firefly S01E01.mkv", b"ep");

    let state = StateManager::new();
    let analyzer = MissingEpisodeAnalyzer::new(Arc::new(client(&server)), state.clone());
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let missing = analyzer.analyze(&[root], &cancel_rx).await.unwrap();

    assert!(missing.is_empty());
    assert_eq!(state.snapshot().processed, 1);
    assert!(server.requests_to("GET", "/api/v3/episode").is_empty());
}

#[tokio::test]
async fn test_analysis_without_api_key_finds_nothing() {
    let server = StubServer::start(sonarr_routes()).await;
    let (_guard, root) = utf8_temp_dir();
    write_file(&root, "Firefly (2002)/Season 01/Firefly S01E01.mkv", b"ep");

    let client = SonarrClient::new(&format!("{}/api/v3", server.base_url), "").unwrap();
    let analyzer = MissingEpisodeAnalyzer::new(Arc::new(client), StateManager::new());
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let missing = analyzer.analyze(&[root], &cancel_rx).await.unwrap();

    assert!(missing.is_empty());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_tvmaze_premiere_year_is_cached() {
    let server = StubServer::start(vec![Route::new(
        "GET",
        "/singlesearch/shows",
        200,
        r#"{"id": 180, "name": "Firefly", "premiered": "2002-09-20"}"#,
    )])
    .await;
    let client = TvMazeClient::new(server.base_url.clone()).unwrap();

    assert_eq!(client.premiere_year("Firefly").await, Some("2002".to_string()));
    assert_eq!(client.premiere_year("firefly").await, Some("2002".to_string()));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, "/singlesearch/shows?q=Firefly");
}

#[tokio::test]
async fn test_tvmaze_not_found_is_none() {
    let server = StubServer::start(vec![]).await;
    let client = TvMazeClient::new(server.base_url.clone()).unwrap();

    assert_eq!(client.premiere_year("Nonexistent Show").await, None);
    assert_eq!(client.premiere_year("Nonexistent Show").await, None);
    assert_eq!(server.requests().len(), 1);
}
