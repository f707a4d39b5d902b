//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 10 minutes
    /// - `daily_limit` is 0
    /// - `max_concurrency`, `enrich_top_n`, `max_results` or `fast_cache_capacity` is 0
    /// - `backoff_base_ms` exceeds `backoff_max_ms`
    /// - `max_retries` exceeds 10
    /// - `firecrawl_base_url` or `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 600_000 {
            return Err(invalid("timeout_ms", "must not exceed 10 minutes (600000ms)"));
        }

        if self.daily_limit == Some(0) {
            return Err(invalid("daily_limit", "must be greater than 0"));
        }

        if self.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be greater than 0"));
        }

        if self.max_retries > 10 {
            return Err(invalid("max_retries", "must not exceed 10"));
        }

        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(invalid("backoff_base_ms", "must not exceed backoff_max_ms"));
        }

        if self.enrich_top_n == 0 {
            return Err(invalid("enrich_top_n", "must be greater than 0"));
        }

        if self.max_results == 0 {
            return Err(invalid("max_results", "must be greater than 0"));
        }

        if self.fast_cache_capacity == 0 {
            return Err(invalid("fast_cache_capacity", "must be greater than 0"));
        }

        if self.firecrawl_base_url.trim().is_empty() {
            return Err(invalid("firecrawl_base_url", "must not be empty"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.enrich_top_n > 20 {
            tracing::warn!(
                enrich_top_n = self.enrich_top_n,
                "enrich_top_n is large; every ratings search spends one quota slot per candidate"
            );
        }

        Ok(())
    }
}
