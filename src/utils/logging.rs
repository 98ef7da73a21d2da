//! Structured logging and security-focused trace utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing utilities to prevent
//! GitHub access tokens from leaking into logs.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefixes of GitHub token formats (classic PAT, OAuth, user-to-server,
/// server-to-server, refresh, fine-grained PAT).
const TOKEN_PREFIXES: [&str; 6] = ["ghp_", "gho_", "ghu_", "ghs_", "ghr_", "github_pat_"];

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Configure filter from environment or config file
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Sanitizes GitHub tokens out of log messages.
///
/// Every token-looking word (one of the known prefixes followed by token
/// characters) is replaced with `[REDACTED_TOKEN]`.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    for prefix in TOKEN_PREFIXES {
        let mut search_from = 0;
        while let Some(offset) = result[search_from..].find(prefix) {
            let start = search_from + offset;
            // Search for the end of the token (first non-token character)
            let end = result[start..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .map(|i| start + i)
                .unwrap_or(result.len());
            result.replace_range(start..end, "[REDACTED_TOKEN]");
            search_from = start + "[REDACTED_TOKEN]".len();
        }
    }

    result
}
