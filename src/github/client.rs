// GitHub API client: repository list, subject metadata, language histograms
// Author: kelexine (https://github.com/kelexine)

use crate::config::GitHubConfig;
use crate::error::{Result, StatsError};
use crate::models::github::{ErrorResponse, LanguagesResponse, RepoResponse, UserResponse};
use crate::models::{FetchOutcome, LanguageHistogram, Repository, SubjectProfile};
use crate::utils::logging::sanitize;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Client for the GitHub REST API.
///
/// Fetches everything needed to build a subject's language profile:
/// - the repository list (paginated) and the subject metadata, concurrently
/// - one language histogram per countable repository, in fixed-size batches
#[derive(Clone)]
pub struct GitHubClient {
    http_client: Client,
    config: GitHubConfig,
}

/// Why a per-repository histogram had to be estimated.
#[derive(Debug)]
enum HistogramFailure {
    Timeout,
    Network(String),
    Status(u16),
    Decode(String),
}

impl HistogramFailure {
    fn reason(&self) -> &'static str {
        match self {
            HistogramFailure::Timeout => "timeout",
            HistogramFailure::Network(_) => "network",
            HistogramFailure::Status(_) => "status",
            HistogramFailure::Decode(_) => "decode",
        }
    }
}

impl std::fmt::Display for HistogramFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistogramFailure::Timeout => write!(f, "request timed out"),
            HistogramFailure::Network(e) => write!(f, "network error: {}", e),
            HistogramFailure::Status(s) => write!(f, "HTTP {}", s),
            HistogramFailure::Decode(e) => write!(f, "invalid body: {}", e),
        }
    }
}

impl GitHubClient {
    /// Create a new GitHub client with a pooled HTTP connection.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .pool_max_idle_per_host(config.batch_size.max(1))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .default_headers(headers)
            .use_rustls_tls()
            .build()
            .map_err(|e| StatsError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created GitHub HTTP client for {}", config.api_base_url);

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    /// Fetch the repositories, metadata and language histograms of `subject`.
    ///
    /// Fails with `NotFound` when the subject does not exist and `Upstream`
    /// for other non-success responses of the two subject-level calls.
    /// Per-repository histogram failures never fail the call: the
    /// repository's primary language and size are used instead.
    pub async fn fetch(&self, subject: &str, token: Option<&str>) -> Result<FetchOutcome> {
        let started = Instant::now();

        let (repositories, profile) = tokio::try_join!(
            self.list_repositories(subject, token),
            self.fetch_profile(subject, token),
        )?;

        let countable: Vec<Repository> = repositories
            .iter()
            .filter(|repo| repo.is_countable())
            .cloned()
            .collect();

        debug!(
            "{} has {} repositories, {} countable",
            subject,
            repositories.len(),
            countable.len()
        );

        let histograms = self.fetch_histograms(&countable, token).await;
        let estimated = histograms.iter().filter(|h| h.estimated).count();

        info!(
            "Fetched {} language histograms for {} in {}ms ({} estimated)",
            histograms.len(),
            subject,
            started.elapsed().as_millis(),
            estimated
        );

        Ok(FetchOutcome {
            profile,
            repositories,
            histograms,
        })
    }

    /// Fetch histograms batch by batch; each batch is joined before the next
    /// one starts, with a fixed pause in between.
    async fn fetch_histograms(
        &self,
        repositories: &[Repository],
        token: Option<&str>,
    ) -> Vec<LanguageHistogram> {
        let batch_size = self.config.batch_size.max(1);
        let delay = Duration::from_millis(self.config.batch_delay_ms);
        let batch_count = repositories.len().div_ceil(batch_size);
        let mut histograms = Vec::with_capacity(repositories.len());

        for (index, batch) in repositories.chunks(batch_size).enumerate() {
            debug!(
                "Fetching language batch {}/{} ({} repositories)",
                index + 1,
                batch_count,
                batch.len()
            );

            let results = join_all(
                batch
                    .iter()
                    .map(|repo| self.fetch_histogram_or_estimate(repo, token)),
            )
            .await;
            histograms.extend(results);

            if index + 1 < batch_count && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        histograms
    }

    async fn fetch_histogram_or_estimate(
        &self,
        repo: &Repository,
        token: Option<&str>,
    ) -> LanguageHistogram {
        match self.fetch_languages(repo, token).await {
            Ok(languages) => LanguageHistogram::new(repo.name.clone(), languages),
            Err(failure) => {
                warn!(
                    "Language fetch for {}/{} failed ({}); estimating from primary language",
                    repo.owner, repo.name, failure
                );
                crate::metrics::record_fallback_estimate(failure.reason());
                LanguageHistogram::estimate(repo)
            }
        }
    }

    async fn fetch_languages(
        &self,
        repo: &Repository,
        token: Option<&str>,
    ) -> std::result::Result<LanguagesResponse, HistogramFailure> {
        let url = format!(
            "{}/repos/{}/{}/languages",
            self.config.api_base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        );

        let started = Instant::now();
        let response = self
            .request(&url, token)
            .send()
            .await
            .map_err(|e| {
                crate::metrics::record_github_call("languages", 0, started.elapsed().as_secs_f64());
                if e.is_timeout() {
                    HistogramFailure::Timeout
                } else {
                    HistogramFailure::Network(e.to_string())
                }
            })?;

        let status = response.status();
        crate::metrics::record_github_call(
            "languages",
            status.as_u16(),
            started.elapsed().as_secs_f64(),
        );

        if !status.is_success() {
            return Err(HistogramFailure::Status(status.as_u16()));
        }

        response.json::<LanguagesResponse>().await.map_err(|e| {
            if e.is_timeout() {
                HistogramFailure::Timeout
            } else {
                HistogramFailure::Decode(e.to_string())
            }
        })
    }

    /// List the subject's repositories, following pages until a short page
    /// or `max_pages`.
    async fn list_repositories(
        &self,
        subject: &str,
        token: Option<&str>,
    ) -> Result<Vec<Repository>> {
        let per_page = self.config.per_page.clamp(1, 100);
        let mut repositories = Vec::new();

        for page in 1..=self.config.max_pages.max(1) {
            let url = format!(
                "{}/users/{}/repos?per_page={}&page={}&type=owner&sort=updated",
                self.config.api_base_url,
                urlencoding::encode(subject),
                per_page,
                page
            );

            let batch: Vec<RepoResponse> = self.get_json("repos", &url, subject, token).await?;
            let received = batch.len();
            repositories.extend(
                batch
                    .into_iter()
                    .map(|repo| Repository::from_response(repo, subject)),
            );

            if received < per_page {
                break;
            }
        }

        Ok(repositories)
    }

    async fn fetch_profile(&self, subject: &str, token: Option<&str>) -> Result<SubjectProfile> {
        let url = format!(
            "{}/users/{}",
            self.config.api_base_url,
            urlencoding::encode(subject)
        );

        let user: UserResponse = self.get_json("user", &url, subject, token).await?;
        Ok(user.into())
    }

    /// GET a subject-level JSON document, mapping failures to the error taxonomy.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        subject: &str,
        token: Option<&str>,
    ) -> Result<T> {
        debug!("GET {}", url);
        let started = Instant::now();

        let response = self.request(url, token).send().await.map_err(|e| {
            crate::metrics::record_github_call(endpoint, 0, started.elapsed().as_secs_f64());
            Self::transport_error(endpoint, e)
        })?;

        let status = response.status();
        crate::metrics::record_github_call(endpoint, status.as_u16(), started.elapsed().as_secs_f64());

        if !status.is_success() {
            return Err(Self::status_error(status, subject, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Self::transport_error(endpoint, e))
    }

    fn request(&self, url: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .http_client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent);

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        request
    }

    fn transport_error(endpoint: &str, error: reqwest::Error) -> StatsError {
        if error.is_timeout() {
            StatsError::Timeout(format!("GitHub {} request: {}", endpoint, error))
        } else if error.is_decode() {
            StatsError::Upstream {
                status: 200,
                message: format!("Invalid {} response: {}", endpoint, error),
            }
        } else {
            StatsError::Upstream {
                status: 0,
                message: format!("GitHub {} request failed: {}", endpoint, error),
            }
        }
    }

    async fn status_error(status: StatusCode, subject: &str, response: Response) -> StatsError {
        if status == StatusCode::NOT_FOUND {
            return StatsError::NotFound(subject.to_string());
        }

        let body = response.text().await.unwrap_or_default();
        let message = Self::extract_error_message(&body).unwrap_or_else(|| sanitize(&body));
        warn!("GitHub API error: HTTP {} - {}", status, message);

        StatsError::Upstream {
            status: status.as_u16(),
            message,
        }
    }

    /// Extract the `message` field GitHub puts in error documents
    fn extract_error_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|e| e.message)
            .map(|m| sanitize(&m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"message":"API rate limit exceeded","documentation_url":"https://docs.github.com"}"#;
        assert_eq!(
            GitHubClient::extract_error_message(body).as_deref(),
            Some("API rate limit exceeded")
        );
        assert_eq!(GitHubClient::extract_error_message("<html>"), None);
    }

    #[test]
    fn test_failure_reasons() {
        assert_eq!(HistogramFailure::Timeout.reason(), "timeout");
        assert_eq!(HistogramFailure::Status(502).reason(), "status");
        assert_eq!(HistogramFailure::Status(502).to_string(), "HTTP 502");
    }
}
