//! Language statistics service: cache lookup, fetch on miss, selection and
//! rendering.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::cache::{CacheSource, CacheStats, CacheTier, Invalidation, SetOptions};
use crate::chart::{render_chart, RenderOptions};
use crate::config::{AppConfig, ChartConfig};
use crate::error::{Result, StatsError};
use crate::github::GitHubClient;
use crate::languages::{select, summarize};
use crate::models::{AggregateOptions, LanguageReport, LanguageSummary};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cache entry kind for stored summaries.
pub const SUMMARY_KIND: &str = "language-summary";

/// Tag carried by every summary entry.
pub const LANGUAGES_TAG: &str = "languages";

lazy_static! {
    // GitHub logins: alphanumerics and single hyphens, no leading/trailing hyphen, max 39.
    static ref SUBJECT_PATTERN: Regex =
        Regex::new(r"^[a-z0-9](?:[a-z0-9]|-[a-z0-9]){0,38}$").expect("valid subject regex");
}

/// Cache key of a subject's summary.
pub fn summary_key(subject: &str) -> String {
    format!("languages:{}", subject)
}

/// Tag of every entry belonging to `subject`.
pub fn subject_tag(subject: &str) -> String {
    format!("subject:{}", subject)
}

/// Trim and lowercase a subject, rejecting anything that is not a valid login.
pub fn normalize_subject(subject: &str) -> Result<String> {
    let normalized = subject.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(StatsError::InvalidRequest(
            "Missing username parameter".to_string(),
        ));
    }
    if normalized.len() > 39 || !SUBJECT_PATTERN.is_match(&normalized) {
        return Err(StatsError::InvalidRequest(format!(
            "Invalid username '{}'",
            subject.trim()
        )));
    }
    Ok(normalized)
}

/// One language statistics request.
#[derive(Debug, Clone)]
pub struct StatsRequest {
    pub subject: String,
    pub options: AggregateOptions,
    pub render: RenderOptions,
    /// Return the report as data instead of an SVG document.
    pub raw: bool,
    /// Add the processing-time badge to the SVG.
    pub show_time: bool,
}

impl StatsRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            options: AggregateOptions::default(),
            render: RenderOptions::default(),
            raw: false,
            show_time: false,
        }
    }

    /// A request using the configured chart defaults, as the HTTP surface does
    /// when no query options are given.
    pub fn with_defaults(subject: impl Into<String>, defaults: &ChartConfig) -> Self {
        Self {
            options: AggregateOptions::new(defaults.min_percentage, defaults.max_languages),
            render: RenderOptions {
                theme: defaults.default_theme.clone(),
                ..RenderOptions::default()
            },
            ..Self::new(subject)
        }
    }
}

#[derive(Debug, Clone)]
pub enum StatsPayload {
    Document(String),
    Data(LanguageReport),
}

#[derive(Debug, Clone)]
pub struct StatsResponse {
    pub payload: StatsPayload,
    pub cache_source: CacheSource,
    pub processing_time: Duration,
    pub total_languages: usize,
    pub total_bytes: u64,
}

/// Entry point combining the fetcher, the cache tier and the renderer.
pub struct LanguageStatsService {
    client: GitHubClient,
    cache: Arc<CacheTier>,
    token: Option<String>,
    summary_ttl: Duration,
}

impl LanguageStatsService {
    pub fn new(client: GitHubClient, cache: Arc<CacheTier>, config: &AppConfig) -> Self {
        Self {
            client,
            cache,
            token: config
                .github
                .token
                .clone()
                .filter(|token| !token.trim().is_empty()),
            summary_ttl: Duration::from_secs(config.cache.default_ttl_seconds),
        }
    }

    pub fn cache(&self) -> &Arc<CacheTier> {
        &self.cache
    }

    /// Base URL of the upstream API.
    pub fn upstream(&self) -> &str {
        self.client.base_url()
    }

    /// Resolve, select and render the languages of `request.subject`.
    pub async fn get_language_stats(&self, request: StatsRequest) -> Result<StatsResponse> {
        let started = Instant::now();
        let (summary, cache_source) = self.summary(&request.subject).await?;

        let report = select(&summary, &request.options);
        let total_languages = report.total_languages;
        let total_bytes = report.total_bytes;

        let payload = if request.raw {
            StatsPayload::Data(report)
        } else {
            let timing = request.show_time.then(|| started.elapsed());
            StatsPayload::Document(render_chart(&report, &request.render, timing))
        };

        let processing_time = started.elapsed();
        debug!(
            "Served {} for {} from {} in {}ms",
            if request.raw { "data" } else { "chart" },
            request.subject.trim(),
            cache_source.as_str(),
            processing_time.as_millis()
        );

        Ok(StatsResponse {
            payload,
            cache_source,
            processing_time,
            total_languages,
            total_bytes,
        })
    }

    /// Unfiltered summary of `subject`, from cache when possible.
    pub async fn summary(&self, subject: &str) -> Result<(LanguageSummary, CacheSource)> {
        let normalized = normalize_subject(subject)?;
        let key = summary_key(&normalized);

        if let Some((summary, source)) = self.cache.get::<LanguageSummary>(&key).await {
            return Ok((summary, source));
        }

        let outcome = self.client.fetch(subject.trim(), self.token.as_deref()).await?;
        let summary = summarize(&outcome.histograms, outcome.profile);

        let options = SetOptions::new(SUMMARY_KIND)
            .ttl(self.summary_ttl)
            .tag(LANGUAGES_TAG)
            .tag(subject_tag(&normalized))
            .subject(normalized.clone());
        if !self.cache.set(&key, &summary, options).await {
            warn!("Summary for {} was not cached", normalized);
        }

        Ok((summary, CacheSource::Fresh))
    }

    /// Drop every cached entry of `subject`.
    pub async fn invalidate_subject(&self, subject: &str) -> Result<usize> {
        let normalized = normalize_subject(subject)?;
        let removed = self
            .cache
            .invalidate(Invalidation::Tag(subject_tag(&normalized)))
            .await?;
        info!("Invalidated {} cached entries for {}", removed, normalized);
        Ok(removed)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_subject() {
        assert_eq!(normalize_subject("  Octocat ").unwrap(), "octocat");
        assert_eq!(normalize_subject("a-b-c").unwrap(), "a-b-c");
        assert_eq!(normalize_subject("x").unwrap(), "x");
    }

    #[test]
    fn test_rejects_invalid_subjects() {
        for subject in ["", "   ", "-leading", "trailing-", "two--hyphens", "has space", "a/b"] {
            assert!(
                matches!(normalize_subject(subject), Err(StatsError::InvalidRequest(_))),
                "{:?} should be rejected",
                subject
            );
        }
        assert!(normalize_subject(&"a".repeat(40)).is_err());
    }

    #[test]
    fn test_request_with_configured_defaults() {
        let defaults = ChartConfig {
            default_theme: "dracula".to_string(),
            max_languages: 3,
            min_percentage: 5.0,
        };
        let request = StatsRequest::with_defaults("octocat", &defaults);
        assert_eq!(request.subject, "octocat");
        assert_eq!(request.render.theme, "dracula");
        assert_eq!(request.options.max_languages, 3);
        assert_eq!(request.options.min_percentage, 5.0);
        assert!(!request.raw);
    }

    #[test]
    fn test_keys_and_tags() {
        assert_eq!(summary_key("octocat"), "languages:octocat");
        assert_eq!(subject_tag("octocat"), "subject:octocat");
    }
}
