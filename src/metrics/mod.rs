// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics, CACHE_ENTRIES, CACHE_OPERATIONS, FALLBACK_ESTIMATES, GITHUB_API_CALLS,
    GITHUB_API_DURATION, RENDERS, REQUESTS_TOTAL, REQUEST_DURATION,
};

/// Helper to record request metrics
pub fn record_request(endpoint: &str, status_code: u16, cache_source: &str, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[endpoint, &status_code.to_string(), cache_source])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[endpoint, cache_source])
        .observe(duration_secs);
}

/// Helper to record GitHub API call metrics
pub fn record_github_call(endpoint: &str, status_code: u16, duration_secs: f64) {
    GITHUB_API_CALLS
        .with_label_values(&[endpoint, &status_code.to_string()])
        .inc();

    GITHUB_API_DURATION
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

pub fn record_fallback_estimate(reason: &str) {
    FALLBACK_ESTIMATES.with_label_values(&[reason]).inc();
}

/// Helpers to record cache operations per tier
pub fn record_cache_hit(tier: &str) {
    CACHE_OPERATIONS.with_label_values(&[tier, "hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["all", "miss"]).inc();
}

pub fn record_cache_set(tier: &str) {
    CACHE_OPERATIONS.with_label_values(&[tier, "set"]).inc();
}

pub fn record_cache_reject() {
    CACHE_OPERATIONS.with_label_values(&["all", "reject"]).inc();
}

pub fn record_cache_evictions(tier: &str, count: usize) {
    if count > 0 {
        CACHE_OPERATIONS
            .with_label_values(&[tier, "evict"])
            .inc_by(count as f64);
    }
}

pub fn update_cache_entries(tier: &str, count: u64) {
    CACHE_ENTRIES.with_label_values(&[tier]).set(count as f64);
}

pub fn record_render(kind: &str) {
    RENDERS.with_label_values(&[kind]).inc();
}
