//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (BESTOF_*)
//! 2. TOML config file (if BESTOF_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Deployment profile. Selects the default cache TTL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Production,
    Development,
    Testing,
}

impl Profile {
    /// Default result-cache TTL in seconds for this profile.
    pub fn default_cache_ttl_secs(self) -> u64 {
        match self {
            Profile::Production => 86_400,
            Profile::Development => 300,
            Profile::Testing => 60,
        }
    }
}

/// Firecrawl subscription plan. Selects the default daily quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Business,
}

impl Plan {
    /// Requests per rolling 24h window included in the plan.
    pub fn daily_limit(self) -> u32 {
        match self {
            Plan::Free => 100,
            Plan::Pro => 1_000,
            Plan::Business => 10_000,
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (BESTOF_*)
/// 2. TOML config file (if BESTOF_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Firecrawl API key, sent as a bearer token.
    ///
    /// Set via BESTOF_FIRECRAWL_API_KEY environment variable.
    /// Required only when a search reaches the provider.
    #[serde(default)]
    pub firecrawl_api_key: Option<String>,

    /// Firecrawl API base URL.
    #[serde(default = "default_base_url")]
    pub firecrawl_base_url: String,

    /// Path to SQLite cache database (durable tier and search history).
    ///
    /// Set via BESTOF_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for provider requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Deployment profile (production, development, testing).
    #[serde(default)]
    pub profile: Profile,

    /// Subscription plan used to derive the daily quota.
    #[serde(default)]
    pub plan: Plan,

    /// Explicit daily request limit; overrides the plan default.
    #[serde(default)]
    pub daily_limit: Option<u32>,

    /// Explicit cache TTL in seconds; overrides the profile default.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    /// Per-attempt provider timeout in milliseconds.
    ///
    /// Set via BESTOF_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Maximum provider calls in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Resident memory (MiB) above which relief runs before an attempt. 0 disables.
    #[serde(default = "default_memory_threshold_mb")]
    pub memory_threshold_mb: u64,

    /// Pause after a memory relief pass in milliseconds.
    #[serde(default = "default_memory_pause_ms")]
    pub memory_pause_ms: u64,

    /// Candidates enriched with a detail call for ratings searches.
    #[serde(default = "default_enrich_top_n")]
    pub enrich_top_n: usize,

    /// Maximum results returned for relevance searches.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Entry capacity of the in-process cache tier.
    #[serde(default = "default_fast_cache_capacity")]
    pub fast_cache_capacity: u64,

    /// How long finished background job statuses stay pollable, in seconds.
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,

    /// Interval between polls of an asynchronous provider job in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_base_url() -> String {
    "https://api.firecrawl.dev".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./bestof-cache.sqlite")
}

fn default_user_agent() -> String {
    "bestof/0.1".into()
}

fn default_timeout_ms() -> u64 {
    300_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_max_concurrency() -> usize {
    1
}

fn default_memory_threshold_mb() -> u64 {
    512
}

fn default_memory_pause_ms() -> u64 {
    500
}

fn default_enrich_top_n() -> usize {
    5
}

fn default_max_results() -> usize {
    10
}

fn default_fast_cache_capacity() -> u64 {
    1_000
}

fn default_job_ttl_secs() -> u64 {
    3_600
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            firecrawl_api_key: None,
            firecrawl_base_url: default_base_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            profile: Profile::default(),
            plan: Plan::default(),
            daily_limit: None,
            cache_ttl_secs: None,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_concurrency: default_max_concurrency(),
            memory_threshold_mb: default_memory_threshold_mb(),
            memory_pause_ms: default_memory_pause_ms(),
            enrich_top_n: default_enrich_top_n(),
            max_results: default_max_results(),
            fast_cache_capacity: default_fast_cache_capacity(),
            job_ttl_secs: default_job_ttl_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Per-attempt timeout as Duration for use with tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective daily limit: explicit override or the plan default.
    pub fn effective_daily_limit(&self) -> u32 {
        self.daily_limit.unwrap_or_else(|| self.plan.daily_limit())
    }

    /// Effective cache TTL: explicit override or the profile default.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.unwrap_or_else(|| self.profile.default_cache_ttl_secs()))
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Memory threshold in bytes, `None` when the check is disabled.
    pub fn memory_threshold_bytes(&self) -> Option<u64> {
        (self.memory_threshold_mb > 0).then(|| self.memory_threshold_mb * 1024 * 1024)
    }

    pub fn memory_pause(&self) -> Duration {
        Duration::from_millis(self.memory_pause_ms)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `BESTOF_`
    /// 2. TOML file from `BESTOF_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("BESTOF_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("BESTOF_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::from_figment(figment)
    }

    /// Extract and validate a configuration from a prepared figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the Firecrawl API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set or blank.
    pub fn require_firecrawl_api_key(&self) -> Result<&str, ConfigError> {
        self.firecrawl_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "firecrawl_api_key".into(),
                hint: "Set BESTOF_FIRECRAWL_API_KEY environment variable".into(),
            })
    }
}
