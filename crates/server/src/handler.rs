//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    BestSearchParams, CachePurgeParams, SearchHistoryParams, SearchStatusParams, history_impl, purge_impl, quota_impl,
    search_impl, start_impl, status_impl,
};

use bestof_client::{SearchJobs, SearchOrchestrator};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;
use std::time::Duration;

/// The main MCP server handler for bestof.
#[derive(Clone)]
pub struct BestofServer {
    orchestrator: Arc<SearchOrchestrator>,
    jobs: SearchJobs,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl BestofServer {
    /// Create a new server handler. Background job status is kept for `job_ttl`.
    pub fn new(orchestrator: Arc<SearchOrchestrator>, job_ttl: Duration) -> Self {
        let jobs = SearchJobs::new(orchestrator.clone(), job_ttl);
        Self { orchestrator, jobs, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Find the best results for a query on one website. ranking_type \"relevance\" keeps provider order; \"ratings\" enriches the top candidates with review summaries and sorts by rating. Waits for the search to finish."
    )]
    async fn best_search(&self, params: Parameters<BestSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.orchestrator, params.0).await
    }

    #[tool(
        description = "Start the same search as best_search in the background and return a job id immediately. Poll it with search_status."
    )]
    async fn search_start(&self, params: Parameters<BestSearchParams>) -> Result<CallToolResult, McpError> {
        start_impl(&self.jobs, params.0).await
    }

    #[tool(description = "Get the state of a background search. Completed jobs include their results.")]
    async fn search_status(&self, params: Parameters<SearchStatusParams>) -> Result<CallToolResult, McpError> {
        status_impl(&self.jobs, params.0).await
    }

    #[tool(description = "Show provider requests used and remaining in the current 24-hour window.")]
    async fn quota_status(&self) -> Result<CallToolResult, McpError> {
        quota_impl(&self.orchestrator).await
    }

    #[tool(description = "List a user's past searches, newest first.")]
    async fn search_history(&self, params: Parameters<SearchHistoryParams>) -> Result<CallToolResult, McpError> {
        history_impl(&self.orchestrator, params.0).await
    }

    #[tool(
        description = "Remove expired entries from the result cache. Given website and query, also forget that search's cached results."
    )]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.orchestrator.cache(), params.0).await
    }
}

impl ServerHandler for BestofServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "bestof".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Search a website for the best matches to a query. Use best_search for a blocking call or \
                 search_start + search_status to poll."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
