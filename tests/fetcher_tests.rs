// GitHub fetcher tests against a mock API host
// Author: kelexine (https://github.com/kelexine)

use langstats::config::GitHubConfig;
use langstats::error::StatsError;
use langstats::github::GitHubClient;
use langstats::languages::summarize;
use mockito::{Matcher, Mock, Server, ServerGuard};

const REPOS: &str = r#"[
    {"name": "repoA", "owner": {"login": "octocat"}, "language": "JavaScript", "size": 1, "fork": false},
    {"name": "repoB", "owner": {"login": "octocat"}, "language": "Python", "size": 2, "fork": false},
    {"name": "repoC", "owner": {"login": "octocat"}, "language": "Go", "size": 9, "fork": true},
    {"name": "empty", "owner": {"login": "octocat"}, "language": null, "size": 0, "fork": false}
]"#;

const USER: &str = r#"{"login": "octocat", "name": "The Octocat", "public_repos": 4}"#;

fn client_for(server: &ServerGuard) -> GitHubClient {
    GitHubClient::new(&GitHubConfig {
        api_base_url: server.url(),
        batch_size: 2,
        batch_delay_ms: 0,
        timeout_seconds: 5,
        ..GitHubConfig::default()
    })
    .unwrap()
}

async fn mock_subject(server: &mut ServerGuard) -> Vec<Mock> {
    let repos = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPOS)
        .create_async()
        .await;
    let user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER)
        .create_async()
        .await;
    vec![repos, user]
}

#[tokio::test]
async fn test_fetch_aggregates_owned_repositories() {
    let mut server = Server::new_async().await;
    let _subject = mock_subject(&mut server).await;
    let _repo_a = server
        .mock("GET", "/repos/octocat/repoA/languages")
        .with_status(200)
        .with_body(r#"{"JavaScript": 800, "TypeScript": 200}"#)
        .create_async()
        .await;
    let _repo_b = server
        .mock("GET", "/repos/octocat/repoB/languages")
        .with_status(200)
        .with_body(r#"{"Python": 1000}"#)
        .create_async()
        .await;
    let forked = server
        .mock("GET", "/repos/octocat/repoC/languages")
        .expect(0)
        .create_async()
        .await;

    let outcome = client_for(&server).fetch("octocat", None).await.unwrap();
    forked.assert_async().await;

    assert_eq!(outcome.repositories.len(), 4);
    assert_eq!(outcome.histograms.len(), 2);
    assert_eq!(outcome.profile.name.as_deref(), Some("The Octocat"));

    let summary = summarize(&outcome.histograms, outcome.profile);
    let shares: Vec<(&str, u64, f64, usize)> = summary
        .languages
        .iter()
        .map(|e| (e.name.as_str(), e.bytes, e.percentage, e.repo_count))
        .collect();
    assert_eq!(
        shares,
        vec![
            ("Python", 1000, 50.0, 1),
            ("JavaScript", 800, 40.0, 1),
            ("TypeScript", 200, 10.0, 1),
        ]
    );
    assert_eq!(summary.total_bytes, 2000);
    assert_eq!(summary.estimated_repositories, 0);
}

#[tokio::test]
async fn test_failed_histogram_falls_back_to_primary_language_estimate() {
    let mut server = Server::new_async().await;
    let _subject = mock_subject(&mut server).await;
    let _repo_a = server
        .mock("GET", "/repos/octocat/repoA/languages")
        .with_status(200)
        .with_body(r#"{"JavaScript": 800}"#)
        .create_async()
        .await;
    let _repo_b = server
        .mock("GET", "/repos/octocat/repoB/languages")
        .with_status(500)
        .with_body(r#"{"message": "Server Error"}"#)
        .create_async()
        .await;

    let outcome = client_for(&server).fetch("octocat", None).await.unwrap();

    let estimated: Vec<_> = outcome.histograms.iter().filter(|h| h.estimated).collect();
    assert_eq!(estimated.len(), 1);
    assert_eq!(estimated[0].repository, "repoB");
    assert_eq!(estimated[0].languages.get("Python"), Some(&2048));

    let summary = summarize(&outcome.histograms, outcome.profile);
    assert_eq!(summary.estimated_repositories, 1);
    assert_eq!(summary.total_bytes, 800 + 2048);
}

#[tokio::test]
async fn test_unknown_subject_is_not_found() {
    let mut server = Server::new_async().await;
    let _repos = server
        .mock("GET", "/users/ghost/repos")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;
    let _user = server
        .mock("GET", "/users/ghost")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let err = client_for(&server).fetch("ghost", None).await.unwrap_err();
    assert!(matches!(err, StatsError::NotFound(ref s) if s == "ghost"), "{:?}", err);
}

#[tokio::test]
async fn test_server_error_on_repository_list_is_upstream() {
    let mut server = Server::new_async().await;
    let _repos = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message": "Internal failure"}"#)
        .create_async()
        .await;
    let _user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_body(USER)
        .create_async()
        .await;

    let err = client_for(&server).fetch("octocat", None).await.unwrap_err();
    match err {
        StatsError::Upstream { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal failure"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_token_is_sent_as_bearer() {
    let mut server = Server::new_async().await;
    let repos = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer ghp_test")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let _user = server
        .mock("GET", "/users/octocat")
        .match_header("authorization", "Bearer ghp_test")
        .with_status(200)
        .with_body(USER)
        .create_async()
        .await;

    let outcome = client_for(&server).fetch("octocat", Some("ghp_test")).await.unwrap();
    repos.assert_async().await;
    assert!(outcome.histograms.is_empty());
}

fn repo_page(names: &[&str]) -> String {
    let repos: Vec<String> = names
        .iter()
        .map(|name| {
            format!(
                r#"{{"name": "{}", "owner": {{"login": "octocat"}}, "language": "Rust", "size": 1, "fork": false}}"#,
                name
            )
        })
        .collect();
    format!("[{}]", repos.join(","))
}

async fn mock_page(server: &mut ServerGuard, page: &str, body: String, hits: usize) -> Mock {
    server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::UrlEncoded("page".into(), page.into()))
        .with_status(200)
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_stalled_histogram_times_out_to_estimate() {
    let mut server = Server::new_async().await;
    let _repos = server
        .mock("GET", "/users/octocat/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(repo_page(&["slow"]))
        .create_async()
        .await;
    let _user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_body(USER)
        .create_async()
        .await;
    let _slow = server
        .mock("GET", "/repos/octocat/slow/languages")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(br#"{"Rust": 1}"#)
        })
        .create_async()
        .await;

    let client = GitHubClient::new(&GitHubConfig {
        api_base_url: server.url(),
        timeout_seconds: 1,
        batch_delay_ms: 0,
        ..GitHubConfig::default()
    })
    .unwrap();

    let outcome = client.fetch("octocat", None).await.unwrap();
    assert_eq!(outcome.histograms.len(), 1);
    let histogram = &outcome.histograms[0];
    assert_eq!(histogram.repository, "slow");
    assert!(histogram.estimated);
    assert_eq!(histogram.languages.get("Rust"), Some(&1024));
}

#[tokio::test]
async fn test_pagination_stops_at_short_page_and_batches_every_repository() {
    let mut server = Server::new_async().await;
    let first = mock_page(&mut server, "1", repo_page(&["r1", "r2"]), 1).await;
    let second = mock_page(&mut server, "2", repo_page(&["r3", "r4"]), 1).await;
    let third = mock_page(&mut server, "3", repo_page(&["r5"]), 1).await;
    let fourth = mock_page(&mut server, "4", repo_page(&[]), 0).await;
    let _user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_body(USER)
        .create_async()
        .await;

    let mut languages = Vec::new();
    for name in ["r1", "r2", "r3", "r4", "r5"] {
        languages.push(
            server
                .mock("GET", format!("/repos/octocat/{}/languages", name).as_str())
                .with_status(200)
                .with_body(r#"{"Rust": 100}"#)
                .expect(1)
                .create_async()
                .await,
        );
    }

    let client = GitHubClient::new(&GitHubConfig {
        api_base_url: server.url(),
        per_page: 2,
        max_pages: 10,
        batch_size: 2,
        batch_delay_ms: 150,
        ..GitHubConfig::default()
    })
    .unwrap();

    let started = std::time::Instant::now();
    let outcome = client.fetch("octocat", None).await.unwrap();
    let elapsed = started.elapsed();

    for mock in [&first, &second, &third, &fourth] {
        mock.assert_async().await;
    }
    for mock in &languages {
        mock.assert_async().await;
    }
    assert_eq!(outcome.repositories.len(), 5);
    assert_eq!(outcome.histograms.len(), 5);
    assert!(outcome.histograms.iter().all(|h| !h.estimated));
    // Five repositories in batches of two: three batches, two pauses between them
    assert!(elapsed >= std::time::Duration::from_millis(300), "{:?}", elapsed);
}

#[tokio::test]
async fn test_pagination_stops_at_max_pages() {
    let mut server = Server::new_async().await;
    let first = mock_page(&mut server, "1", repo_page(&["r1"]), 1).await;
    let second = mock_page(&mut server, "2", repo_page(&["r2"]), 1).await;
    let third = mock_page(&mut server, "3", repo_page(&["r3"]), 0).await;
    let _user = server
        .mock("GET", "/users/octocat")
        .with_status(200)
        .with_body(USER)
        .create_async()
        .await;
    let languages = server
        .mock("GET", Matcher::Regex(r"^/repos/octocat/r\d/languages$".to_string()))
        .with_status(200)
        .with_body(r#"{"Rust": 10}"#)
        .expect(2)
        .create_async()
        .await;

    let client = GitHubClient::new(&GitHubConfig {
        api_base_url: server.url(),
        per_page: 1,
        max_pages: 2,
        batch_delay_ms: 0,
        ..GitHubConfig::default()
    })
    .unwrap();

    let outcome = client.fetch("octocat", None).await.unwrap();
    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
    languages.assert_async().await;
    assert_eq!(outcome.repositories.len(), 2);
}
