//! Axum-based HTTP server for langstats.
//!
//! Serves language cards and data for a GitHub account, plus cache
//! administration, health and Prometheus endpoints.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (languages, cache, health, metrics).
//! - `middleware`: Request ID propagation layers.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{HealthResponse, HealthStatus, InvalidateRequest, LanguagesQuery};
pub use routes::{create_router, AppState};
