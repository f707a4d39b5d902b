//! Firecrawl API client error types.

use std::sync::Arc;

use crate::executor::Retryable;

/// Errors from the Firecrawl extract API client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FirecrawlError {
    /// Missing API key.
    #[error("missing API key: BESTOF_FIRECRAWL_API_KEY not set")]
    MissingApiKey,

    /// Request rejected before sending (empty target, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Account has no credits left.
    #[error("payment required: {0}")]
    PaymentRequired(String),

    /// Rate limited by Firecrawl.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Firecrawl refused the job because too many are already running.
    #[error("concurrency limit reached: {0}")]
    ConcurrencyLimited(String),

    /// Firecrawl answered `success: false` for a reason that retrying will not fix.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// HTTP error response.
    #[error("HTTP error: {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Asynchronous extract job ended without data.
    #[error("extract job {id} ended with status {status}")]
    JobFailed { id: String, status: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FirecrawlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FirecrawlError::Timeout } else { FirecrawlError::Network(Arc::new(err)) }
    }
}

impl FirecrawlError {
    /// Whether this is a credentials problem rather than a request problem.
    pub fn is_auth(&self) -> bool {
        matches!(self, FirecrawlError::AuthError(_) | FirecrawlError::MissingApiKey)
    }
}

impl Retryable for FirecrawlError {
    /// Timeouts, 408/5xx, rate and concurrency limits, and connection-level
    /// network failures are retried. Everything else is terminal.
    fn is_retryable(&self) -> bool {
        match self {
            FirecrawlError::RateLimited | FirecrawlError::ConcurrencyLimited(_) | FirecrawlError::Timeout => true,
            FirecrawlError::HttpError { status, .. } => *status == 408 || *status >= 500,
            FirecrawlError::Network(e) => !e.is_builder() && !e.is_decode(),
            FirecrawlError::MissingApiKey
            | FirecrawlError::InvalidRequest(_)
            | FirecrawlError::AuthError(_)
            | FirecrawlError::PaymentRequired(_)
            | FirecrawlError::Rejected(_)
            | FirecrawlError::JobFailed { .. }
            | FirecrawlError::Parse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FirecrawlError::MissingApiKey;
        assert!(err.to_string().contains("API key"));

        let err = FirecrawlError::HttpError { status: 503, message: "unavailable".into() };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_retry_classification() {
        assert!(FirecrawlError::Timeout.is_retryable());
        assert!(FirecrawlError::RateLimited.is_retryable());
        assert!(FirecrawlError::ConcurrencyLimited("busy".into()).is_retryable());
        assert!(FirecrawlError::HttpError { status: 502, message: String::new() }.is_retryable());
        assert!(FirecrawlError::HttpError { status: 408, message: String::new() }.is_retryable());

        assert!(!FirecrawlError::AuthError("bad key".into()).is_retryable());
        assert!(!FirecrawlError::HttpError { status: 400, message: String::new() }.is_retryable());
        assert!(!FirecrawlError::PaymentRequired("no credits".into()).is_retryable());
        assert!(!FirecrawlError::Parse("eof".into()).is_retryable());
        assert!(!FirecrawlError::Rejected("invalid schema".into()).is_retryable());
    }
}
