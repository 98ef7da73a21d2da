// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_vec_with_registry,
    register_histogram_vec_with_registry, CounterVec, Encoder, GaugeVec, HistogramVec, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of HTTP requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("requests_total", "Total number of API requests"),
        &["endpoint", "status_code", "cache_source"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["endpoint", "cache_source"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // GITHUB API METRICS
    // ============================================================================

    /// Total GitHub API calls
    pub static ref GITHUB_API_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("github_api_calls_total", "Total GitHub API calls"),
        &["endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// GitHub API call duration
    pub static ref GITHUB_API_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("github_api_duration_seconds", "GitHub API call duration")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["endpoint"],
        REGISTRY
    ).unwrap();

    /// Repositories whose histogram was replaced by the primary-language estimate
    pub static ref FALLBACK_ESTIMATES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("language_fallback_estimates_total", "Per-repository language fetches replaced by an estimate"),
        &["reason"], // reason: timeout, network, status, decode
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total cache operations"),
        &["tier", "operation"], // tier: memory, durable; operation: hit, miss, set, reject, evict
        REGISTRY
    ).unwrap();

    /// Current cache entries
    pub static ref CACHE_ENTRIES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("cache_entries_current", "Current number of cache entries"),
        &["tier"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // RENDER METRICS
    // ============================================================================

    /// Rendered charts
    pub static ref RENDERS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("charts_rendered_total", "Total charts rendered"),
        &["kind"],
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
