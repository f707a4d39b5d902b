//! MCP tool implementations.
//!
//! This module contains all tools exposed by the bestof server.

pub mod cache;
pub mod history;
pub mod jobs;
pub mod quota;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CachePurgeParams, purge_impl};
pub use history::{SearchHistoryParams, history_impl};
pub use jobs::{SearchStatusParams, start_impl, status_impl};
pub use quota::quota_impl;
pub use search::{BestSearchParams, search_impl};

use bestof_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
