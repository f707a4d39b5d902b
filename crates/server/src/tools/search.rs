//! best_search tool implementation.
//!
//! Runs a search to completion and returns the normalized results.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use bestof_client::SearchOrchestrator;
use bestof_core::{RankingType, ResultRecord, SearchError};

use super::json_result;

/// Input parameters for the best_search and search_start tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BestSearchParams {
    /// Site to search, e.g. "allrecipes.com".
    pub website: String,

    /// What to look for, e.g. "chocolate chip cookies".
    pub query: String,

    /// Result ordering.
    /// - "relevance": provider order (default)
    /// - "ratings": top candidates enriched with reviews and sorted by rating
    #[serde(default)]
    pub ranking_type: Option<String>,

    /// Record the search in this user's history (optional).
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl BestSearchParams {
    pub fn ranking(&self) -> Result<RankingType, SearchError> {
        self.ranking_type.as_deref().unwrap_or_default().parse()
    }
}

/// Output structure for the best_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BestSearchOutput {
    pub website: String,
    pub query: String,
    pub ranking_type: RankingType,
    /// Number of results returned.
    pub count: usize,
    pub results: Vec<ResultRecord>,
}

/// Implementation of the best_search tool.
pub async fn search_impl(orchestrator: &SearchOrchestrator, params: BestSearchParams) -> Result<CallToolResult, McpError> {
    let ranking = params.ranking()?;

    let results = match params.user_id {
        Some(user_id) => orchestrator.search_for_user(user_id, &params.website, &params.query, ranking).await?,
        None => orchestrator.search(&params.website, &params.query, ranking).await?,
    };

    json_result(&BestSearchOutput {
        website: params.website,
        query: params.query,
        ranking_type: ranking,
        count: results.len(),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{orchestrator, output_json};
    use serde_json::json;

    fn params(ranking_type: Option<&str>) -> BestSearchParams {
        BestSearchParams {
            website: "allrecipes.com".into(),
            query: "cookies".into(),
            ranking_type: ranking_type.map(str::to_string),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_best_search_relevance() {
        let orch = orchestrator(
            json!({"data": {"results": [
                {"title": "Best Cookies", "url": "https://allrecipes.com/r/1", "rating": 4.5},
                {"title": "Other Cookies", "url": "https://allrecipes.com/r/2"}
            ]}}),
            10,
        );

        let result = search_impl(&orch, params(None)).await.unwrap();
        let output = output_json(&result);

        assert_eq!(output["ranking_type"], "relevance");
        assert_eq!(output["count"], 2);
        assert_eq!(output["results"][0]["title"], "Best Cookies");
        assert_eq!(output["results"][0]["rating"], 4.5);
    }

    #[tokio::test]
    async fn test_best_search_ratings() {
        let orch = orchestrator(
            json!([
                {"title": "A", "url": "https://allrecipes.com/a"},
                {"title": "B", "url": "https://allrecipes.com/b"}
            ]),
            10,
        );

        let result = search_impl(&orch, params(Some("Ratings"))).await.unwrap();
        let output = output_json(&result);

        assert_eq!(output["ranking_type"], "ratings");
        assert_eq!(output["count"], 2);
        assert_eq!(output["results"][0]["rank"], 1);
        assert!(output["results"][0].get("summary").is_some());
    }

    #[tokio::test]
    async fn test_best_search_bad_ranking() {
        let orch = orchestrator(json!([]), 10);
        let err = search_impl(&orch, params(Some("popularity"))).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_best_search_quota_exceeded() {
        let orch = orchestrator(json!([{"title": "A", "url": "https://allrecipes.com/a"}]), 0);
        let err = search_impl(&orch, params(None)).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
    }
}
