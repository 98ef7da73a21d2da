// Error types for the langstats service
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Subject not found: {0}")]
    NotFound(String),

    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StatsError {
    /// HTTP status and machine-readable error type for this error.
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            StatsError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found_error"),
            StatsError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            StatsError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error"),
            StatsError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            StatsError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large_error")
            }
            StatsError::CacheUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "cache_unavailable_error")
            }
            StatsError::Config(_) | StatsError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "api_error"),
        }
    }
}

// Convert StatsError to HTTP responses for Axum
impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
