//! The remote extraction provider seen by the orchestrator.

use async_trait::async_trait;
use serde_json::Value;

use crate::firecrawl::FirecrawlError;

/// A content-extraction service returning JSON of unpredictable shape.
///
/// [`crate::LazyFirecrawlClient`] is the production implementation; tests
/// script their own.
#[async_trait]
pub trait ExtractProvider: Send + Sync {
    /// Primary search: candidate results for `query` on `website`.
    async fn search(&self, website: &str, query: &str, max_results: usize) -> Result<Value, FirecrawlError>;

    /// Detail and commentary for one candidate page.
    async fn detail(&self, url: &str) -> Result<Value, FirecrawlError>;

    /// Fails when no call can succeed, e.g. credentials are missing.
    ///
    /// Checked before quota is reserved for a call.
    fn ensure_ready(&self) -> Result<(), FirecrawlError> {
        Ok(())
    }
}
