//! Configuration data structures for langstats.
//!
//! This module defines the schema for the application settings: the HTTP
//! server, the GitHub client, the two cache tiers, chart defaults and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, workers).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// In-process and durable cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Defaults applied to chart requests that leave options unset.
    #[serde(default)]
    pub chart: ChartConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads for the Tokio runtime.
    /// Default: Number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// `max-age` advertised in the `Cache-Control` header of rendered cards.
    /// Default: `1800` (30 minutes)
    #[serde(default = "default_cache_control")]
    pub cache_control_seconds: u64,
}

/// Settings for the upstream GitHub REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL for the GitHub REST API.
    /// Default: `https://api.github.com`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Personal access token sent as a bearer token. Optional; anonymous
    /// requests are heavily rate limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of concurrent language requests per batch.
    /// Default: `10`
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between two batches, in milliseconds.
    /// Default: `100`
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,

    /// Page size for the repository list call (GitHub caps this at 100).
    /// Default: `100`
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Maximum number of repository list pages to follow.
    /// Default: `3`
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Value of the `User-Agent` header (required by GitHub).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Settings for the two-tier cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of entries in the in-process tier, in seconds.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_memory_ttl")]
    pub memory_ttl_seconds: u64,

    /// Maximum number of entries held by the in-process tier.
    /// Default: `1000`
    #[serde(default = "default_memory_max_entries")]
    pub memory_max_entries: usize,

    /// Lifetime of entries when `set` is called without a TTL, in seconds.
    /// Default: `3600` (1 hour)
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,

    /// Payloads larger than this are compressed in the durable tier.
    /// Default: `1024`
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold_bytes: usize,

    /// gzip level used by the default compressor (0-9).
    /// Default: `6`
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Payloads larger than this are rejected by `set`.
    /// Default: `1048576` (1 MiB)
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: usize,

    /// Interval of the background expiry sweep, in seconds.
    /// Default: `300`
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Whether the durable tier should be used at all.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub durable_enabled: bool,

    /// SQLite database file for the durable tier (`:memory:` is accepted).
    /// Default: `~/.langstats/cache.db`
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Maximum number of pooled SQLite connections.
    /// Default: `4`
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection attempts before falling back to memory-only mode.
    /// Default: `3`
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Fixed delay between two connection attempts, in milliseconds.
    /// Default: `500`
    #[serde(default = "default_connect_backoff")]
    pub connect_backoff_ms: u64,
}

/// Defaults applied to chart requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Theme used when the request does not name one.
    /// Default: `default`
    #[serde(default = "default_theme")]
    pub default_theme: String,

    /// Maximum number of languages displayed (capped at 8).
    /// Default: `8`
    #[serde(default = "default_max_languages")]
    pub max_languages: usize,

    /// Languages below this share (in percent) are hidden.
    /// Default: `0.0`
    #[serde(default)]
    pub min_percentage: f64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            cache_control_seconds: default_cache_control(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            timeout_seconds: default_timeout(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_ttl_seconds: default_memory_ttl(),
            memory_max_entries: default_memory_max_entries(),
            default_ttl_seconds: default_ttl(),
            compression_threshold_bytes: default_compression_threshold(),
            compression_level: default_compression_level(),
            max_entry_bytes: default_max_entry_bytes(),
            sweep_interval_seconds: default_sweep_interval(),
            durable_enabled: true,
            database_path: default_database_path(),
            pool_size: default_pool_size(),
            connect_attempts: default_connect_attempts(),
            connect_backoff_ms: default_connect_backoff(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_theme: default_theme(),
            max_languages: default_max_languages(),
            min_percentage: 0.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cache_control() -> u64 {
    1800
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay() -> u64 {
    100
}

fn default_per_page() -> usize {
    100
}

fn default_max_pages() -> usize {
    3
}

fn default_user_agent() -> String {
    format!("langstats/{}", env!("CARGO_PKG_VERSION"))
}

fn default_memory_ttl() -> u64 {
    300 // 5 minutes
}

fn default_memory_max_entries() -> usize {
    1000
}

fn default_ttl() -> u64 {
    3600
}

fn default_compression_threshold() -> usize {
    1024
}

fn default_compression_level() -> u32 {
    6
}

fn default_max_entry_bytes() -> usize {
    1024 * 1024
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_database_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".langstats")
        .join("cache.db")
        .to_string_lossy()
        .to_string()
}

fn default_pool_size() -> usize {
    4
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_connect_backoff() -> u64 {
    500
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_max_languages() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
