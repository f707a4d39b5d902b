//! Unified error types for bestof.
//!
//! [`Error`] covers infrastructure (cache database, configuration, job
//! registry). [`SearchError`] is what a search caller has to handle.

use chrono::{DateTime, Utc};
use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Infrastructure errors for the bestof workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty job id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A cache tier could not be read or written.
    #[error("CACHE_UNAVAILABLE: {0}")]
    CacheUnavailable(String),

    /// Cached payload could not be encoded or decoded.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(String),

    /// No background job with the given id.
    #[error("JOB_NOT_FOUND: {0}")]
    JobNotFound(String),
}

/// Errors surfaced by a search.
///
/// Quota and auth failures are kept apart so the caller can render specific
/// messaging; provider failures are split by whether retrying could help.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// Daily request quota is used up until `reset_time`.
    #[error("QUOTA_EXCEEDED: daily limit of {limit} requests reached, resets at {reset_time}")]
    QuotaExceeded { limit: u32, reset_time: DateTime<Utc> },

    /// Provider rejected the credentials.
    #[error("AUTH_ERROR: {0}")]
    Auth(String),

    /// Transient provider failure that outlived the retry budget.
    #[error("API_ERROR: {0}")]
    Retryable(String),

    /// Provider failure that retrying cannot fix.
    #[error("API_ERROR: {0}")]
    Terminal(String),

    /// Caller supplied an unusable website, query or ranking type.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl SearchError {
    /// Whether the same request may succeed later without changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::QuotaExceeded { .. } | SearchError::Retryable(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CacheUnavailable(msg) => (-32002, msg.clone()),
            Error::Serialization(msg) => (-32003, msg.clone()),
            Error::JobNotFound(msg) => (-32004, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<SearchError> for McpError {
    fn from(err: SearchError) -> Self {
        let code = match &err {
            SearchError::InvalidInput(_) => -32602,
            SearchError::QuotaExceeded { .. } => -32010,
            SearchError::Auth(_) => -32011,
            SearchError::Retryable(_) => -32012,
            SearchError::Terminal(_) => -32013,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
