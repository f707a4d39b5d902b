//! cache_purge tool implementation.
//!
//! Sweeps expired rows out of the durable tier and optionally drops one
//! search's cached results.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use bestof_core::cache::hash::{primary_fingerprint, request_fingerprint};
use bestof_core::{Error, RankingType, ResultCache};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Also forget cached results for this site (requires `query`).
    #[serde(default)]
    pub website: Option<String>,

    /// Also forget cached results for this query (requires `website`).
    #[serde(default)]
    pub query: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of expired durable entries deleted.
    pub deleted: u64,
    /// Whether a specific search was invalidated.
    pub invalidated: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &ResultCache, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let target = match (params.website.as_deref(), params.query.as_deref()) {
        (Some(website), Some(query)) if !website.trim().is_empty() && !query.trim().is_empty() => {
            Some((website, query))
        }
        (None, None) => None,
        _ => return Err(Error::InvalidInput("website and query must be given together".into()).into()),
    };

    let invalidated = match target {
        Some((website, query)) => {
            for key in [
                request_fingerprint(website, query, RankingType::Relevance),
                request_fingerprint(website, query, RankingType::Ratings),
                primary_fingerprint(website, query),
            ] {
                cache.invalidate(&key).await?;
            }
            tracing::info!(website, query, "invalidated cached search");
            true
        }
        None => false,
    };

    let deleted = cache.purge_expired().await?;
    tracing::info!(deleted, "purged expired cache entries");

    json_result(&CachePurgeOutput { deleted, invalidated })
}
