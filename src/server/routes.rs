// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    cache_stats_handler, health_handler, invalidate_handler, languages_handler, metrics_handler,
};
use super::middleware::request_id_layers;
use crate::config::AppConfig;
use crate::error::Result;
use crate::stats::LanguageStatsService;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body; only the invalidation endpoint takes one.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<LanguageStatsService>,
}

pub fn create_router(config: AppConfig, service: Arc<LanguageStatsService>) -> Result<Router> {
    let state = AppState {
        config: Arc::new(config),
        service,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/languages", get(languages_handler))
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/api/cache/invalidate", post(invalidate_handler))
        .layer(tower_http::limit::RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
