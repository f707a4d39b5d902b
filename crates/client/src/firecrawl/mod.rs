//! Firecrawl extract API client.
//!
//! ### Protocol
//!
//! - **Endpoint**: `POST {base_url}/v1/extract`, job polling at `GET {base_url}/v1/extract/{id}`
//! - **Authentication**: bearer token.
//! - **Status codes**:
//!   - 401/403 → auth failure (terminal)
//!   - 402 → out of credits (terminal)
//!   - 429 → rate or concurrency limit (retryable)
//!   - 408/5xx → transient (retryable)
//! - **Jobs**: a response carrying only a job id is polled until it completes
//!   or fails. The caller's timeout bounds the polling.
//!
//! Retries, quota and concurrency limits are not handled here; the
//! orchestrator runs every call through the bounded executor.

pub mod error;
pub mod request;
pub mod response;

pub use error::FirecrawlError;
pub use request::ExtractRequest;
pub use response::{ExtractEnvelope, ExtractOutcome};

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use bestof_core::AppConfig;

use crate::executor::Retryable;
use crate::provider::ExtractProvider;

/// Default base URL for the Firecrawl API.
const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Default HTTP timeout for a single request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "bestof/0.1";

/// Default interval between job status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on status polls for one job.
const MAX_POLLS: u32 = 600;

/// Consecutive transient poll failures tolerated before the job is given up.
const MAX_POLL_FAILURES: u32 = 3;

/// Firecrawl client configuration.
#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
    /// API key sent as bearer token.
    pub api_key: String,
    /// Base URL (default: https://api.firecrawl.dev).
    pub base_url: String,
    /// HTTP timeout per request (default: 300s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
    /// Delay between job status polls (default: 2s).
    pub poll_interval: Duration,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl FirecrawlConfig {
    /// Build from the application configuration.
    ///
    /// Fails with `MissingApiKey` when no key is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FirecrawlError> {
        let api_key = config
            .require_firecrawl_api_key()
            .map_err(|_| FirecrawlError::MissingApiKey)?
            .to_string();

        Ok(Self {
            api_key,
            base_url: config.firecrawl_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            poll_interval: config.poll_interval(),
        })
    }
}

/// Firecrawl API client.
#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    http: reqwest::Client,
    config: Arc<FirecrawlConfig>,
}

impl FirecrawlClient {
    /// Create a new Firecrawl client with the given configuration.
    pub fn new(config: FirecrawlConfig) -> Result<Self, FirecrawlError> {
        if config.api_key.trim().is_empty() {
            return Err(FirecrawlError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FirecrawlError::Network(Arc::new(e)))?;

        Ok(Self { http, config: Arc::new(config) })
    }

    /// Create a client from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FirecrawlError> {
        Self::new(FirecrawlConfig::from_app_config(config)?)
    }

    /// Run an extract request, polling the job if Firecrawl answers asynchronously.
    ///
    /// Returns the raw response body of the completed extraction.
    pub async fn extract(&self, req: &ExtractRequest) -> Result<Value, FirecrawlError> {
        req.validate()?;

        let start = Instant::now();
        let url = format!("{}/v1/extract", self.config.base_url);

        tracing::debug!(target_url = %req.urls.join(","), "submitting Firecrawl extract");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .json(req)
            .send()
            .await?;

        let body = Self::read_body(response).await?;

        let result = match ExtractOutcome::from_body(body) {
            ExtractOutcome::Ready(body) => Ok(body),
            ExtractOutcome::Pending { id } => self.poll_job(&id).await,
            ExtractOutcome::Failed { id, status } => Err(FirecrawlError::JobFailed { id, status }),
        };

        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, ok = result.is_ok(), "Firecrawl extract finished");
        result
    }

    /// Poll an asynchronous extract job until it completes or fails.
    ///
    /// Up to `MAX_POLL_FAILURES` consecutive transient poll failures are
    /// absorbed here; the job is never resubmitted from this loop.
    async fn poll_job(&self, id: &str) -> Result<Value, FirecrawlError> {
        let url = format!("{}/v1/extract/{}", self.config.base_url, id);
        let mut failures = 0;

        for poll in 1..=MAX_POLLS {
            tokio::time::sleep(self.config.poll_interval).await;

            match self.poll_once(&url).await {
                Ok(ExtractOutcome::Ready(body)) => {
                    tracing::debug!(job_id = id, polls = poll, "Firecrawl job completed");
                    return Ok(body);
                }
                Ok(ExtractOutcome::Pending { .. }) => {
                    failures = 0;
                    tracing::trace!(job_id = id, polls = poll, "Firecrawl job still running");
                }
                Ok(ExtractOutcome::Failed { id, status }) => return Err(FirecrawlError::JobFailed { id, status }),
                Err(e) if e.is_retryable() && failures < MAX_POLL_FAILURES => {
                    failures += 1;
                    tracing::warn!(job_id = id, failures, error = %e, "Firecrawl job poll failed, polling again");
                }
                Err(e) => return Err(e),
            }
        }

        Err(FirecrawlError::Timeout)
    }

    async fn poll_once(&self, url: &str) -> Result<ExtractOutcome, FirecrawlError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Ok(ExtractOutcome::from_body(Self::read_body(response).await?))
    }

    /// Map the HTTP status to an error and parse a successful body as JSON.
    async fn read_body(response: reqwest::Response) -> Result<Value, FirecrawlError> {
        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Firecrawl response status");

        let bytes = response.bytes().await?;
        let body: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .map(response::error_message)
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(Self::status_error(status, message));
        }

        let body = body.ok_or_else(|| FirecrawlError::Parse("response body is not JSON".into()))?;

        // job status bodies carry their own failure state
        if body.get("success").and_then(Value::as_bool) == Some(false) && body.get("status").is_none() {
            return Err(Self::rejection(response::error_message(&body)));
        }

        Ok(body)
    }

    /// Classify a `success: false` body by its message.
    fn rejection(message: String) -> FirecrawlError {
        let lower = message.to_ascii_lowercase();
        if lower.contains("concurrency") {
            FirecrawlError::ConcurrencyLimited(message)
        } else if AUTH_MARKERS.iter().any(|marker| lower.contains(marker)) {
            FirecrawlError::AuthError(message)
        } else if lower.contains("credits") {
            FirecrawlError::PaymentRequired(message)
        } else {
            FirecrawlError::Rejected(message)
        }
    }

    fn status_error(status: StatusCode, message: String) -> FirecrawlError {
        match status.as_u16() {
            401 | 403 => FirecrawlError::AuthError(message),
            402 => FirecrawlError::PaymentRequired(message),
            429 if mentions_concurrency(&message) => FirecrawlError::ConcurrencyLimited(message),
            429 => FirecrawlError::RateLimited,
            code => FirecrawlError::HttpError { status: code, message },
        }
    }
}

/// Message fragments Firecrawl uses for credential problems.
const AUTH_MARKERS: &[&str] = &["unauthorized", "forbidden", "api key", "invalid token", "authentication"];

fn mentions_concurrency(message: &str) -> bool {
    message.to_ascii_lowercase().contains("concurrency")
}

#[async_trait]
impl ExtractProvider for FirecrawlClient {
    async fn search(&self, website: &str, query: &str, max_results: usize) -> Result<Value, FirecrawlError> {
        self.extract(&ExtractRequest::primary_search(website, query, max_results)).await
    }

    async fn detail(&self, url: &str) -> Result<Value, FirecrawlError> {
        self.extract(&ExtractRequest::detail(url)).await
    }
}

/// Provider that builds its [`FirecrawlClient`] on first use.
///
/// The server starts without an API key; a search that reaches the provider
/// then fails with `MissingApiKey`. A client built once is reused.
#[derive(Debug)]
pub struct LazyFirecrawlClient {
    config: AppConfig,
    client: OnceCell<FirecrawlClient>,
}

impl LazyFirecrawlClient {
    pub fn new(config: AppConfig) -> Self {
        Self { config, client: OnceCell::new() }
    }

    async fn client(&self) -> Result<&FirecrawlClient, FirecrawlError> {
        self.client
            .get_or_try_init(|| async { FirecrawlClient::from_app_config(&self.config) })
            .await
    }
}

#[async_trait]
impl ExtractProvider for LazyFirecrawlClient {
    async fn search(&self, website: &str, query: &str, max_results: usize) -> Result<Value, FirecrawlError> {
        self.client().await?.search(website, query, max_results).await
    }

    async fn detail(&self, url: &str) -> Result<Value, FirecrawlError> {
        self.client().await?.detail(url).await
    }

    fn ensure_ready(&self) -> Result<(), FirecrawlError> {
        self.config
            .require_firecrawl_api_key()
            .map(|_| ())
            .map_err(|_| FirecrawlError::MissingApiKey)
    }
}
