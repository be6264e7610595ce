//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MEETUPS_*)
//! 2. TOML config file (if MEETUPS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MEETUPS_*)
/// 2. TOML config file (if MEETUPS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database.
    ///
    /// Set via MEETUPS_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Age in seconds after which the update marker counts as stale.
    ///
    /// Set via MEETUPS_REFRESH_INTERVAL_SECS environment variable.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Number of upcoming meetups reported at startup.
    ///
    /// Set via MEETUPS_UPCOMING_LIMIT environment variable.
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./meetups.sqlite")
}

fn default_refresh_interval_secs() -> u64 {
    3600
}

fn default_upcoming_limit() -> usize {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            refresh_interval_secs: default_refresh_interval_secs(),
            upcoming_limit: default_upcoming_limit(),
        }
    }
}

impl AppConfig {
    /// Refresh interval as a chrono Duration for marker staleness checks.
    pub fn refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_interval_secs as i64)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var("MEETUPS_CONFIG_FILE").ok();
        Self::extract(&Self::figment(config_file.as_deref()))
    }

    fn figment(config_file: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_path) = config_file {
            figment = figment.merge(Toml::file(config_path));
        }

        figment.merge(
            Env::prefixed("MEETUPS_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    fn extract(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
