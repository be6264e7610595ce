//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use crate::store::marker::INVALIDATION_OFFSET_HOURS;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `db_path` is empty
    /// - `refresh_interval_secs` is 0 or longer than the marker invalidation offset
    /// - `upcoming_limit` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        let max_interval = INVALIDATION_OFFSET_HOURS as u64 * 3600;
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "refresh_interval_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.refresh_interval_secs > max_interval {
            return Err(ConfigError::Invalid {
                field: "refresh_interval_secs".into(),
                reason: format!("must not exceed {max_interval} seconds"),
            });
        }

        if self.upcoming_limit == 0 {
            return Err(ConfigError::Invalid { field: "upcoming_limit".into(), reason: "must be greater than 0".into() });
        }

        if self.refresh_interval_secs < 60 {
            tracing::warn!(
                refresh_interval_secs = self.refresh_interval_secs,
                "refresh interval under a minute; upstream data will be refetched on nearly every check"
            );
        }

        Ok(())
    }
}
