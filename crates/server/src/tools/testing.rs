//! Fixed-response provider and helpers shared by the tool tests.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use bestof_client::{BoundedExecutor, ExecutorConfig, ExtractProvider, FirecrawlError, SearchOrchestrator, SearchSettings};
use bestof_core::{CacheDb, QuotaLimiter, ResultCache};

pub(crate) struct FixedProvider {
    search: Value,
}

#[async_trait]
impl ExtractProvider for FixedProvider {
    async fn search(&self, _website: &str, _query: &str, _max_results: usize) -> Result<Value, FirecrawlError> {
        Ok(self.search.clone())
    }

    async fn detail(&self, _url: &str) -> Result<Value, FirecrawlError> {
        Ok(json!({"data": {"rating": 4.2, "commentSummary": {"summary": "Reviewers approve"}}}))
    }
}

pub(crate) fn orchestrator(search: Value, daily_limit: u32) -> Arc<SearchOrchestrator> {
    Arc::new(build(search, daily_limit, None))
}

pub(crate) fn orchestrator_with_db(search: Value, db: CacheDb) -> Arc<SearchOrchestrator> {
    Arc::new(build(search, 100, Some(db)))
}

fn build(search: Value, daily_limit: u32, db: Option<CacheDb>) -> SearchOrchestrator {
    let cache = Arc::new(ResultCache::new(db.clone(), 100, Duration::from_secs(60)));
    let executor = BoundedExecutor::new(ExecutorConfig { memory_threshold: None, ..ExecutorConfig::default() });
    let settings = SearchSettings { timeout: Duration::from_secs(5), max_retries: 0, ..SearchSettings::default() };

    let orchestrator = SearchOrchestrator::new(
        Arc::new(FixedProvider { search }),
        Arc::new(QuotaLimiter::new(daily_limit)),
        cache,
        executor,
        settings,
    );
    match db {
        Some(db) => orchestrator.with_history(db),
        None => orchestrator,
    }
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output_json(result: &CallToolResult) -> Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content.get("text").and_then(Value::as_str).expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
