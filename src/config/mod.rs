// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{Result, StatsError};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file (`--config` path, or `~/.langstats/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file_path = path
            .map(str::to_string)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // An explicit --config path must exist, the default one may not
            .add_source(File::with_name(&file_path).required(path.is_some()))
            // Override with environment variables (e.g. LANGSTATS__GITHUB__TOKEN)
            .add_source(
                Environment::with_prefix("LANGSTATS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| StatsError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| StatsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the cache and fetcher cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.default_ttl_seconds == 0 || self.cache.memory_ttl_seconds == 0 {
            return Err(StatsError::Config("cache TTLs must be non-zero".to_string()));
        }
        if self.github.batch_size == 0 {
            return Err(StatsError::Config("github.batch_size must be at least 1".to_string()));
        }
        if self.cache.memory_max_entries == 0 {
            return Err(StatsError::Config(
                "cache.memory_max_entries must be at least 1".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(StatsError::Config(format!(
                "unknown logging.format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML (used by `--dump-config`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StatsError::Config(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".langstats")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[github]\nbatch_size = 4\n\n[cache]\nmemory_ttl_seconds = 60\n\n[chart]\ndefault_theme = \"dark\""
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.github.batch_size, 4);
        assert_eq!(config.cache.memory_ttl_seconds, 60);
        assert_eq!(config.chart.default_theme, "dark");
        // Untouched sections keep their defaults
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some("/nonexistent/langstats.toml")).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl_and_batch() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.cache.default_ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.github.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dump_config_round_trips() {
        let text = AppConfig::default().to_toml().unwrap();
        assert!(text.contains("[cache]"));
        assert!(text.contains("compression_threshold_bytes"));
    }
}
