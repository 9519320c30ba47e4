//! Application configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `console.toml` in the working directory, then `AKITECT_*` environment
//! variables. Top-level keys follow the prefix after one underscore
//! (`AKITECT_SERVER_PORT`); nested keys use `__` (`AKITECT_RETRY__MAX_ATTEMPTS`).

use std::time::Duration;

use anyhow::{Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Remote generation service base URL
    pub remote_base_url: String,

    /// Console server port
    pub server_port: u16,

    /// SQLite database holding saved sets
    pub database_url: String,

    /// Timeout of settings reads and writes
    pub settings_timeout_ms: u64,
    /// Timeout of other request/response calls; streams have none
    pub request_timeout_ms: u64,

    /// Sessions with no attached shell and no action for this long are closed
    pub session_idle_timeout_secs: u64,

    pub retry: RetryConfig,
}

/// Backoff for idempotent remote reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl AppConfig {
    /// Load configuration from `console.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::build(
            Config::builder()
                .add_source(File::with_name("console").required(false))
                .add_source(environment()),
        )
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .set_default("remote_base_url", "http://localhost:3501")?
            .set_default("server_port", 3500_i64)?
            .set_default("database_url", "sqlite://akitect_console.db?mode=rwc")?
            .set_default("settings_timeout_ms", 3_000_i64)?
            .set_default("request_timeout_ms", 8_000_i64)?
            .set_default("session_idle_timeout_secs", 1_800_i64)?
            .set_default("retry.max_attempts", 3_i64)?
            .set_default("retry.base_delay_ms", 250_i64)?
            .set_default("retry.max_delay_ms", 2_000_i64)?
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn settings_timeout(&self) -> Duration {
        Duration::from_millis(self.settings_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }

    /// Built-in defaults only, ignoring files and the environment
    #[cfg(test)]
    pub(crate) fn defaults() -> Self {
        Self::build(Config::builder()).expect("defaults are valid")
    }
}

fn environment() -> Environment {
    Environment::with_prefix("AKITECT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults() {
        let config = AppConfig::build(Config::builder()).unwrap();
        assert_eq!(config.remote_base_url, "http://localhost:3501");
        assert_eq!(config.server_port, 3500);
        assert_eq!(config.settings_timeout(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(8));
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(1_800));
        assert_eq!(
            config.retry,
            RetryConfig {
                max_attempts: 3,
                base_delay_ms: 250,
                max_delay_ms: 2_000
            }
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = r#"
            remote_base_url = "http://10.0.0.5:3501"

            [retry]
            max_attempts = 5
        "#;
        let config =
            AppConfig::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml))).unwrap();
        assert_eq!(config.remote_base_url, "http://10.0.0.5:3501");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 250);
    }

    #[test]
    fn test_environment_overrides_file() {
        let vars = config::Map::from([
            ("AKITECT_SERVER_PORT".to_string(), "4100".to_string()),
            ("AKITECT_REMOTE_BASE_URL".to_string(), "http://gpu-box:3501".to_string()),
            ("AKITECT_RETRY__MAX_ATTEMPTS".to_string(), "7".to_string()),
            ("OTHER_SERVER_PORT".to_string(), "1".to_string()),
        ]);
        let config = AppConfig::build(
            Config::builder()
                .add_source(File::from_str("server_port = 3600", FileFormat::Toml))
                .add_source(environment().source(Some(vars))),
        )
        .unwrap();
        assert_eq!(config.server_port, 4100);
        assert_eq!(config.remote_base_url, "http://gpu-box:3501");
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.retry.base_delay_ms, 250);
    }
}
