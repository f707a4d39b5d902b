//! search_history tool implementation.
//!
//! Lists a user's past searches, newest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use bestof_client::SearchOrchestrator;
use bestof_core::{Error, SearchHistoryEntry};

use super::json_result;

/// Maximum entries returned per call.
const MAX_LIMIT: usize = 100;

/// Parameters for the search_history tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHistoryParams {
    pub user_id: i64,

    /// Entries per page (default: 20, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Entries to skip.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Output from the search_history tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHistoryOutput {
    pub user_id: i64,
    pub entries: Vec<SearchHistoryEntry>,
}

/// Implementation of the search_history tool.
pub async fn history_impl(
    orchestrator: &SearchOrchestrator, params: SearchHistoryParams,
) -> Result<CallToolResult, McpError> {
    let db = orchestrator
        .history()
        .ok_or_else(|| Error::CacheUnavailable("search history needs the SQLite database".into()))?;

    let limit = params.limit.clamp(1, MAX_LIMIT);
    let entries = db.list_history(params.user_id, limit, params.offset).await?;

    json_result(&SearchHistoryOutput { user_id: params.user_id, entries })
}
