//! quota_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use bestof_client::SearchOrchestrator;

use super::json_result;

/// Report provider requests used in the current 24-hour window.
pub async fn quota_impl(orchestrator: &SearchOrchestrator) -> Result<CallToolResult, McpError> {
    json_result(&orchestrator.quota().snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::search::{BestSearchParams, search_impl};
    use crate::tools::testing::{orchestrator, output_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_quota_counts_remote_calls_only() {
        let orch = orchestrator(json!([{"title": "A", "url": "https://allrecipes.com/a"}]), 5);
        let params = BestSearchParams {
            website: "allrecipes.com".into(),
            query: "cookies".into(),
            ranking_type: None,
            user_id: None,
        };

        search_impl(&orch, params.clone()).await.unwrap();
        search_impl(&orch, params).await.unwrap();

        let output = output_json(&quota_impl(&orch).await.unwrap());
        assert_eq!(output["count"], 1);
        assert_eq!(output["limit"], 5);
        assert_eq!(output["remaining"], 4);
        assert!(output["reset_time"].is_string());
    }
}
