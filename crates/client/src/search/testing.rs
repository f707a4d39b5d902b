//! Scripted provider and orchestrator wiring shared by the search tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bestof_core::{CacheDb, ManualClock, QuotaLimiter, ResultCache};

use super::{SearchOrchestrator, SearchSettings};
use crate::executor::{BoundedExecutor, ExecutorConfig};
use crate::firecrawl::FirecrawlError;
use crate::provider::ExtractProvider;

/// Provider answering from fixed responses and counting calls.
pub(crate) struct ScriptedProvider {
    search: Result<Value, FirecrawlError>,
    details: HashMap<String, Result<Value, FirecrawlError>>,
    fail_once: Mutex<HashMap<String, FirecrawlError>>,
    ready: bool,
    delay: Duration,
    search_calls: AtomicU32,
    detail_calls: AtomicU32,
}

impl ScriptedProvider {
    pub(crate) fn new(search: Value) -> Self {
        Self {
            search: Ok(search),
            details: HashMap::new(),
            fail_once: Mutex::new(HashMap::new()),
            ready: true,
            delay: Duration::ZERO,
            search_calls: AtomicU32::new(0),
            detail_calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn failing(err: FirecrawlError) -> Self {
        Self { search: Err(err), ..Self::new(Value::Null) }
    }

    pub(crate) fn with_detail(mut self, url: &str, response: Result<Value, FirecrawlError>) -> Self {
        self.details.insert(url.to_string(), response);
        self
    }

    /// The first detail call for `url` fails with `err`; later calls answer normally.
    pub(crate) fn with_detail_failing_once(self, url: &str, err: FirecrawlError) -> Self {
        self.fail_once.lock().unwrap().insert(url.to_string(), err);
        self
    }

    /// Behave like a provider with no credentials configured.
    pub(crate) fn without_credentials(mut self) -> Self {
        self.ready = false;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn detail_calls(&self) -> u32 {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractProvider for ScriptedProvider {
    async fn search(&self, _website: &str, _query: &str, _max_results: usize) -> Result<Value, FirecrawlError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.search.clone()
    }

    async fn detail(&self, url: &str) -> Result<Value, FirecrawlError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_once.lock().unwrap().remove(url) {
            return Err(err);
        }
        self.details.get(url).cloned().unwrap_or_else(|| {
            Ok(json!({"success": true, "data": {"rating": 4.0, "commentSummary": {"summary": "Solid"}}}))
        })
    }

    fn ensure_ready(&self) -> Result<(), FirecrawlError> {
        if self.ready { Ok(()) } else { Err(FirecrawlError::MissingApiKey) }
    }
}

pub(crate) fn orchestrator(provider: Arc<ScriptedProvider>, daily_limit: u32) -> SearchOrchestrator {
    orchestrator_with(provider, daily_limit, Arc::new(ManualClock::default()), None)
}

pub(crate) fn orchestrator_with(
    provider: Arc<ScriptedProvider>, daily_limit: u32, clock: Arc<ManualClock>, db: Option<CacheDb>,
) -> SearchOrchestrator {
    let ttl = Duration::from_secs(60);
    let cache = Arc::new(ResultCache::with_clock(db.clone(), 100, ttl, clock.clone()));
    let quota = Arc::new(QuotaLimiter::with_clock(daily_limit, clock));
    let executor = BoundedExecutor::new(ExecutorConfig {
        max_concurrency: 2,
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(5),
        memory_threshold: None,
        memory_pause: Duration::from_millis(1),
    });
    let settings = SearchSettings {
        max_results: 10,
        enrich_top_n: 5,
        timeout: Duration::from_secs(5),
        max_retries: 2,
        cache_ttl: ttl,
    };

    let orchestrator = SearchOrchestrator::new(provider, quota, cache.clone(), executor.with_relief(cache), settings);
    match db {
        Some(db) => orchestrator.with_history(db),
        None => orchestrator,
    }
}
