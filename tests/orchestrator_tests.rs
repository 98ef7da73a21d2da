// Language stats service: cache sources, selection and invalidation
// Author: kelexine (https://github.com/kelexine)

use langstats::cache::{
    CacheSource, CacheTier, DurableStore, GzipCompressor, SqliteConnector, StoreConnector,
};
use langstats::chart::ChartKind;
use langstats::config::{AppConfig, GitHubConfig};
use langstats::error::StatsError;
use langstats::github::GitHubClient;
use langstats::models::AggregateOptions;
use langstats::stats::{LanguageStatsService, StatsPayload, StatsRequest};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;

fn app_config(server: &ServerGuard) -> AppConfig {
    AppConfig {
        github: GitHubConfig {
            api_base_url: server.url(),
            batch_delay_ms: 0,
            ..GitHubConfig::default()
        },
        ..AppConfig::default()
    }
}

fn service(config: &AppConfig, cache: Arc<CacheTier>) -> LanguageStatsService {
    let client = GitHubClient::new(&config.github).unwrap();
    LanguageStatsService::new(client, cache, config)
}

fn memory_cache(config: &AppConfig) -> Arc<CacheTier> {
    Arc::new(CacheTier::memory_only(
        &config.cache,
        Arc::new(GzipCompressor::default()),
    ))
}

/// Mocks stay registered only while they are alive.
struct AccountMocks {
    _listing: Vec<Mock>,
    languages: Vec<Mock>,
}

impl AccountMocks {
    async fn assert_languages_fetched(&self) {
        for mock in &self.languages {
            mock.assert_async().await;
        }
    }
}

/// Mock an account with three languages fetched `expected_fetches` times.
async fn mock_account(server: &mut ServerGuard, expected_fetches: usize) -> AccountMocks {
    let repos = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"[
                {"name": "repoA", "owner": {"login": "octocat"}, "language": "JavaScript", "size": 1},
                {"name": "repoB", "owner": {"login": "octocat"}, "language": "Python", "size": 1},
                {"name": "repoC", "owner": {"login": "octocat"}, "language": "Go", "size": 1, "fork": true}
            ]"#,
        )
        .expect(expected_fetches)
        .create_async()
        .await;
    let user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_body(r#"{"login": "octocat", "public_repos": 3}"#)
        .create_async()
        .await;

    let a = server
        .mock("GET", "/repos/octocat/repoA/languages")
        .with_status(200)
        .with_body(r#"{"JavaScript": 800, "TypeScript": 200}"#)
        .expect(expected_fetches)
        .create_async()
        .await;
    let b = server
        .mock("GET", "/repos/octocat/repoB/languages")
        .with_status(200)
        .with_body(r#"{"Python": 1000}"#)
        .expect(expected_fetches)
        .create_async()
        .await;
    AccountMocks {
        _listing: vec![repos, user],
        languages: vec![a, b],
    }
}

fn raw_request(subject: &str) -> StatsRequest {
    let mut request = StatsRequest::new(subject);
    request.raw = true;
    request
}

#[tokio::test]
async fn test_second_request_is_served_from_memory() {
    let mut server = Server::new_async().await;
    let mocks = mock_account(&mut server, 1).await;
    let config = app_config(&server);
    let service = service(&config, memory_cache(&config));

    let first = service.get_language_stats(raw_request("octocat")).await.unwrap();
    assert_eq!(first.cache_source, CacheSource::Fresh);
    assert_eq!(first.total_languages, 3);
    assert_eq!(first.total_bytes, 2000);

    let second = service.get_language_stats(raw_request("OctoCat")).await.unwrap();
    assert_eq!(second.cache_source, CacheSource::Memory);

    mocks.assert_languages_fetched().await;
}

#[tokio::test]
async fn test_durable_tier_serves_a_restarted_process() {
    let mut server = Server::new_async().await;
    let _mocks = mock_account(&mut server, 1).await;
    let config = app_config(&server);
    let store: Arc<dyn DurableStore> = SqliteConnector::in_memory().connect().await.unwrap();

    let compressor = Arc::new(GzipCompressor::default());
    let first = service(
        &config,
        Arc::new(CacheTier::with_store(&config.cache, Arc::clone(&store), compressor.clone())),
    );
    let fresh = first.get_language_stats(raw_request("octocat")).await.unwrap();
    assert_eq!(fresh.cache_source, CacheSource::Fresh);

    let restarted = service(
        &config,
        Arc::new(CacheTier::with_store(&config.cache, store, compressor)),
    );
    let cached = restarted.get_language_stats(raw_request("octocat")).await.unwrap();
    assert_eq!(cached.cache_source, CacheSource::Durable);
    assert_eq!(cached.total_bytes, fresh.total_bytes);
}

#[tokio::test]
async fn test_selection_is_applied_per_request() {
    let mut server = Server::new_async().await;
    let _mocks = mock_account(&mut server, 1).await;
    let config = app_config(&server);
    let service = service(&config, memory_cache(&config));

    let mut request = raw_request("octocat");
    request.options = AggregateOptions::new(20.0, 8);
    let filtered = service.get_language_stats(request).await.unwrap();
    let StatsPayload::Data(report) = filtered.payload else {
        panic!("expected data payload");
    };
    let names: Vec<_> = report.languages.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Python", "JavaScript"]);
    // Shares are not rescaled after filtering
    assert_eq!(report.languages[0].percentage, 50.0);
    assert_eq!(report.total_languages, 3);

    let mut request = raw_request("octocat");
    request.options = AggregateOptions::new(0.0, 1);
    let StatsPayload::Data(report) = service.get_language_stats(request).await.unwrap().payload else {
        panic!("expected data payload");
    };
    assert_eq!(report.languages.len(), 1);
}

#[tokio::test]
async fn test_svg_payload_uses_requested_chart() {
    let mut server = Server::new_async().await;
    let _mocks = mock_account(&mut server, 1).await;
    let config = app_config(&server);
    let service = service(&config, memory_cache(&config));

    let mut request = StatsRequest::new("octocat");
    request.render.kind = ChartKind::Bar;
    let response = service.get_language_stats(request).await.unwrap();
    let StatsPayload::Document(svg) = response.payload else {
        panic!("expected svg payload");
    };
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("class=\"bars\""));
    assert!(svg.contains("Python"));
}

#[tokio::test]
async fn test_invalidate_subject_forces_refetch() {
    let mut server = Server::new_async().await;
    let mocks = mock_account(&mut server, 2).await;
    let config = app_config(&server);
    let service = service(&config, memory_cache(&config));

    service.get_language_stats(raw_request("octocat")).await.unwrap();
    assert_eq!(service.invalidate_subject("OCTOCAT").await.unwrap(), 1);

    let refetched = service.get_language_stats(raw_request("octocat")).await.unwrap();
    assert_eq!(refetched.cache_source, CacheSource::Fresh);
    mocks.assert_languages_fetched().await;
}

#[tokio::test]
async fn test_invalid_subject_is_rejected_before_any_call() {
    let server = Server::new_async().await;
    let config = app_config(&server);
    let service = service(&config, memory_cache(&config));

    let err = service.get_language_stats(raw_request("  ")).await.unwrap_err();
    assert!(matches!(err, StatsError::InvalidRequest(_)));
    let err = service.get_language_stats(raw_request("bad/name")).await.unwrap_err();
    assert!(matches!(err, StatsError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let mut server = Server::new_async().await;
    let _repos = server
        .mock("GET", "/users/ghost/repos")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    let _user = server
        .mock("GET", "/users/ghost")
        .with_status(404)
        .create_async()
        .await;
    let config = app_config(&server);
    let service = service(&config, memory_cache(&config));

    for _ in 0..2 {
        let err = service.get_language_stats(raw_request("ghost")).await.unwrap_err();
        assert!(matches!(err, StatsError::NotFound(_)));
    }
    assert_eq!(service.cache_stats().await.sets, 0);
}
