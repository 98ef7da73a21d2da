// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::cache::{CacheStats, Invalidation};
use crate::chart::{render_error_card, DisplayFlags, RenderOptions};
use crate::config::ChartConfig;
use crate::error::{Result, StatsError};
use crate::metrics;
use crate::models::AggregateOptions;
use crate::stats::{StatsPayload, StatsRequest, StatsResponse};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

const LANGUAGES_ENDPOINT: &str = "/api/languages";
const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;
    let cache = state.service.cache();

    // Durable tier
    let durable_check = if cache.is_degraded() {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: "Durable cache unreachable at startup; serving from memory only".to_string(),
        }
    } else if let Some(backend) = cache.durable_backend() {
        HealthCheck {
            status: "ok".to_string(),
            message: format!("Connected ({})", backend),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: "Disabled".to_string(),
        }
    };
    checks.insert("durable_cache".to_string(), durable_check);

    let stats = cache.stats().await;
    checks.insert(
        "memory_cache".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} entries, hit rate {:.2}", stats.memory_entries, stats.hit_rate),
        },
    );

    checks.insert(
        "configuration".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("API base: {}", state.service.upstream()),
        },
    );

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

/// Query string of `GET /api/languages`.
#[derive(Debug, Default, Deserialize)]
pub struct LanguagesQuery {
    pub username: Option<String>,
    pub theme: Option<String>,
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub hide_border: Option<bool>,
    pub hide_title: Option<bool>,
    pub title: Option<String>,
    pub show_percentages: Option<bool>,
    pub max_languages: Option<usize>,
    pub min_percentage: Option<f64>,
    pub format: Option<String>,
    pub show_time: Option<bool>,
}

impl LanguagesQuery {
    /// Keep only the free-form string fields of a query whose typed fields
    /// failed to parse, so the error can still be rendered in the right mode.
    fn strings_only(params: &HashMap<String, String>) -> Self {
        Self {
            username: params.get("username").cloned(),
            theme: params.get("theme").cloned(),
            format: params.get("format").cloned(),
            ..Self::default()
        }
    }

    fn wants_json(&self) -> bool {
        self.format
            .as_deref()
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn theme_or<'a>(&'a self, defaults: &'a ChartConfig) -> &'a str {
        self.theme.as_deref().unwrap_or(&defaults.default_theme)
    }

    /// Build a service request, applying configured defaults.
    fn to_request(&self, defaults: &ChartConfig) -> Result<StatsRequest> {
        let subject = self
            .username
            .clone()
            .ok_or_else(|| StatsError::InvalidRequest("Missing username parameter".to_string()))?;

        let raw = match self.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("svg") => false,
            Some("json") => true,
            Some(other) => {
                return Err(StatsError::InvalidRequest(format!(
                    "Unknown format '{}' (expected svg or json)",
                    other
                )))
            }
        };

        let render = RenderOptions {
            theme: self.theme_or(defaults).to_string(),
            size: self.size.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
            kind: self.kind.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
            flags: DisplayFlags {
                hide_border: self.hide_border.unwrap_or(false),
                hide_title: self.hide_title.unwrap_or(false),
                custom_title: self.title.clone(),
                show_percentages: self.show_percentages.unwrap_or(true),
            },
        };

        Ok(StatsRequest {
            subject,
            options: AggregateOptions::new(
                self.min_percentage.unwrap_or(defaults.min_percentage),
                self.max_languages.unwrap_or(defaults.max_languages),
            ),
            render,
            raw,
            show_time: self.show_time.unwrap_or(false),
        })
    }
}

/// Handler for `GET /api/languages`: an SVG card, or JSON with `format=json`.
///
/// In SVG mode errors are rendered as an error card with the mapped status
/// so embedded images still show something.
pub async fn languages_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
    typed: std::result::Result<Query<LanguagesQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    let (query, parsed) = match typed {
        Ok(Query(query)) => (query, Ok(())),
        Err(rejection) => {
            let query = params
                .map(|Query(params)| LanguagesQuery::strings_only(&params))
                .unwrap_or_default();
            (query, Err(StatsError::InvalidRequest(rejection.body_text())))
        }
    };

    let result = match parsed.and_then(|_| query.to_request(&state.config.chart)) {
        Ok(request) => state.service.get_language_stats(request).await,
        Err(e) => Err(e),
    };

    let (response, source) = match result {
        Ok(stats) => {
            let source = stats.cache_source;
            (stats_response(stats, state.config.server.cache_control_seconds), source.as_str())
        }
        Err(e) => {
            warn!("Language request for {:?} failed: {}", query.username, e);
            let response = if query.wants_json() {
                e.into_response()
            } else {
                error_card_response(&e, query.theme_or(&state.config.chart))
            };
            (response, "none")
        }
    };

    metrics::record_request(
        LANGUAGES_ENDPOINT,
        response.status().as_u16(),
        source,
        started.elapsed().as_secs_f64(),
    );
    response
}

fn stats_response(stats: StatsResponse, max_age: u64) -> Response {
    let cache_source = stats.cache_source;
    let processing_ms = stats.processing_time.as_millis();
    let mut response = match stats.payload {
        StatsPayload::Document(svg) => {
            ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], svg).into_response()
        }
        StatsPayload::Data(report) => Json(report).into_response(),
    };

    let headers = response.headers_mut();
    headers.insert("x-cache", HeaderValue::from_static(cache_source.as_str()));
    if let Ok(value) = HeaderValue::from_str(&processing_ms.to_string()) {
        headers.insert("x-processing-time-ms", value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", max_age)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    response
}

fn error_card_response(error: &StatsError, theme: &str) -> Response {
    let (status, _) = error.status_and_type();
    (
        status,
        [
            (header::CONTENT_TYPE, SVG_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        render_error_card(&error.to_string(), theme),
    )
        .into_response()
}

pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.service.cache_stats().await)
}

/// Body of `POST /api/cache/invalidate`; exactly one field must be set.
#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    pub key: Option<String>,
    pub pattern: Option<String>,
    pub tag: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(body): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let removed = match body {
        InvalidateRequest {
            subject: Some(subject),
            key: None,
            pattern: None,
            tag: None,
        } => state.service.invalidate_subject(&subject).await?,
        InvalidateRequest {
            key: Some(key),
            pattern: None,
            tag: None,
            subject: None,
        } => state.service.cache().invalidate(Invalidation::Key(key)).await?,
        InvalidateRequest {
            pattern: Some(pattern),
            key: None,
            tag: None,
            subject: None,
        } => {
            state
                .service
                .cache()
                .invalidate(Invalidation::Pattern(pattern))
                .await?
        }
        InvalidateRequest {
            tag: Some(tag),
            key: None,
            pattern: None,
            subject: None,
        } => state.service.cache().invalidate(Invalidation::Tag(tag)).await?,
        _ => {
            return Err(StatsError::InvalidRequest(
                "Exactly one of key, pattern, tag or subject is required".to_string(),
            ))
        }
    };

    debug!("Invalidation removed {} entries", removed);
    Ok(Json(InvalidateResponse { removed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, ChartSize};

    #[test]
    fn test_query_applies_defaults() {
        let query = LanguagesQuery {
            username: Some("octocat".to_string()),
            ..LanguagesQuery::default()
        };
        let request = query.to_request(&ChartConfig::default()).unwrap();
        assert_eq!(request.subject, "octocat");
        assert!(!request.raw);
        assert_eq!(request.render.kind, ChartKind::Donut);
        assert_eq!(request.render.size, ChartSize::Medium);
        assert!(request.render.flags.show_percentages);
        assert_eq!(request.options.max_languages, 8);
    }

    #[test]
    fn test_query_parses_options() {
        let query = LanguagesQuery {
            username: Some("octocat".to_string()),
            kind: Some("bar".to_string()),
            size: Some("small".to_string()),
            max_languages: Some(50),
            format: Some("JSON".to_string()),
            ..LanguagesQuery::default()
        };
        let request = query.to_request(&ChartConfig::default()).unwrap();
        assert!(request.raw);
        assert_eq!(request.render.kind, ChartKind::Bar);
        assert_eq!(request.render.size, ChartSize::Small);
        assert_eq!(request.options.max_languages, 8);
    }

    #[test]
    fn test_strings_only_keeps_mode_and_theme() {
        let params: HashMap<String, String> = [
            ("username", "octocat"),
            ("theme", "dark"),
            ("format", "json"),
            ("max_languages", "abc"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let query = LanguagesQuery::strings_only(&params);
        assert!(query.wants_json());
        assert_eq!(query.theme.as_deref(), Some("dark"));
        assert_eq!(query.max_languages, None);
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let missing = LanguagesQuery::default();
        assert!(matches!(
            missing.to_request(&ChartConfig::default()),
            Err(StatsError::InvalidRequest(_))
        ));

        let bad_format = LanguagesQuery {
            username: Some("octocat".to_string()),
            format: Some("png".to_string()),
            ..LanguagesQuery::default()
        };
        assert!(bad_format.to_request(&ChartConfig::default()).is_err());
    }
}
