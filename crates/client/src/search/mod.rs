//! Search orchestration.
//!
//! A search runs through a fixed pipeline:
//!
//! ```text
//! cache lookup → hit → return
//!              → miss → quota check → exceeded → QuotaExceeded
//!                                   → ok → remote call (bounded executor)
//!                                        → normalize → cache write → rank → return
//! ```
//!
//! Ratings searches additionally enrich the top candidates with a detail
//! lookup each. Every remote call, enrichment included, reserves one unit of
//! the daily quota.

pub mod enrich;
pub mod jobs;

#[cfg(test)]
pub(crate) mod testing;

pub use jobs::{JobStatus, SearchJobs, SearchRequest};

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bestof_core::cache::hash::{detail_fingerprint, primary_fingerprint, request_fingerprint};
use bestof_core::{AppConfig, CacheDb, QuotaLimiter, RankingType, ResultCache, ResultRecord, SearchError};

use crate::executor::{BoundedExecutor, ExecutorConfig, ExecutorError};
use crate::firecrawl::{FirecrawlError, LazyFirecrawlClient};
use crate::normalize::{normalize, normalize_detail};
use crate::provider::ExtractProvider;

use enrich::{merge_detail, sort_by_rating};

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Results returned by a relevance search (default: 10).
    pub max_results: usize,
    /// Candidates enriched by a ratings search (default: 5).
    pub enrich_top_n: usize,
    /// Per-attempt timeout for remote calls (default: 300s).
    pub timeout: Duration,
    /// Retries after the first attempt (default: 3).
    pub max_retries: u32,
    /// TTL for cache writes.
    pub cache_ttl: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 10,
            enrich_top_n: 5,
            timeout: Duration::from_secs(300),
            max_retries: 3,
            cache_ttl: Duration::from_secs(86_400),
        }
    }
}

impl SearchSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_results: config.max_results,
            enrich_top_n: config.enrich_top_n,
            timeout: config.timeout(),
            max_retries: config.max_retries,
            cache_ttl: config.cache_ttl(),
        }
    }
}

/// Coordinates cache, quota, executor and provider for one search at a time
/// per fingerprint.
pub struct SearchOrchestrator {
    provider: Arc<dyn ExtractProvider>,
    quota: Arc<QuotaLimiter>,
    cache: Arc<ResultCache>,
    executor: BoundedExecutor,
    history: Option<CacheDb>,
    settings: SearchSettings,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("quota", &self.quota)
            .field("cache", &self.cache)
            .field("executor", &self.executor)
            .field("history", &self.history.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl SearchOrchestrator {
    pub fn new(
        provider: Arc<dyn ExtractProvider>, quota: Arc<QuotaLimiter>, cache: Arc<ResultCache>, executor: BoundedExecutor,
        settings: SearchSettings,
    ) -> Self {
        Self { provider, quota, cache, executor, history: None, settings, in_flight: Mutex::new(HashMap::new()) }
    }

    /// Persist searches made through [`Self::search_for_user`].
    pub fn with_history(mut self, db: CacheDb) -> Self {
        self.history = Some(db);
        self
    }

    /// Wire the production stack from configuration.
    ///
    /// `db` backs both the durable cache tier and search history; `None` runs
    /// with the in-process tier only. The API key is checked by the first
    /// search that reaches the provider.
    pub fn from_config(config: &AppConfig, db: Option<CacheDb>) -> Self {
        let client = LazyFirecrawlClient::new(config.clone());

        let cache = Arc::new(ResultCache::new(db.clone(), config.fast_cache_capacity, config.cache_ttl()));
        let executor = BoundedExecutor::new(ExecutorConfig::from_app_config(config)).with_relief(cache.clone());
        let quota = Arc::new(QuotaLimiter::new(config.effective_daily_limit()));

        let orchestrator =
            Self::new(Arc::new(client), quota, cache, executor, SearchSettings::from_app_config(config));
        match db {
            Some(db) => orchestrator.with_history(db),
            None => orchestrator,
        }
    }

    pub fn quota(&self) -> &QuotaLimiter {
        &self.quota
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn history(&self) -> Option<&CacheDb> {
        self.history.as_ref()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run a search.
    ///
    /// Concurrent callers with the same fingerprint are serialized; the
    /// second one is answered from the cache the first one filled.
    pub async fn search(
        &self, website: &str, query: &str, ranking: RankingType,
    ) -> Result<Vec<ResultRecord>, SearchError> {
        let (website, query) = validate_input(website, query)?;
        let key = request_fingerprint(website, query, ranking);

        if let Some(records) = self.cache.get(&key).await {
            tracing::info!(website, query, ranking = %ranking, results = records.len(), "search served from cache");
            return Ok(records);
        }

        let result = self.single_flight(&key, self.run_locked(&key, website, query, ranking)).await;

        match &result {
            Ok(records) => {
                tracing::info!(website, query, ranking = %ranking, results = records.len(), "search completed");
            }
            Err(e) => tracing::warn!(website, query, ranking = %ranking, error = %e, "search failed"),
        }
        result
    }

    /// Record a search in the user's history, then run it.
    ///
    /// Every search with valid input is recorded, whatever its outcome. The
    /// history write is spawned and never affects the result.
    pub async fn search_for_user(
        &self, user_id: i64, website: &str, query: &str, ranking: RankingType,
    ) -> Result<Vec<ResultRecord>, SearchError> {
        let (site, terms) = validate_input(website, query)?;

        if let Some(db) = self.history.clone() {
            let site = site.to_string();
            let terms = terms.to_string();
            tokio::spawn(async move {
                if let Err(e) = db.record_history(user_id, &site, &terms, ranking).await {
                    tracing::warn!(user_id, error = %e, "failed to record search history");
                }
            });
        }

        self.search(website, query, ranking).await
    }

    /// Read a search's cache slot without touching the provider.
    pub async fn cached(&self, website: &str, query: &str, ranking: RankingType) -> Option<Vec<ResultRecord>> {
        let (website, query) = validate_input(website, query).ok()?;
        self.cache.get(&request_fingerprint(website, query, ranking)).await
    }

    async fn run_locked(
        &self, key: &str, website: &str, query: &str, ranking: RankingType,
    ) -> Result<Vec<ResultRecord>, SearchError> {
        if let Some(records) = self.cache.get(key).await {
            tracing::debug!(key, "search filled by a concurrent caller");
            return Ok(records);
        }

        let primary = self.primary(website, query).await?;

        let (records, settled) = match ranking {
            RankingType::Relevance => (primary.into_iter().take(self.settings.max_results).collect(), true),
            RankingType::Ratings => self.enrich(primary).await,
        };

        // a degraded result is served once; the next search retries the failed details
        if settled {
            self.store(key, &records).await;
        } else {
            tracing::info!(key, "enrichment incomplete, result not cached");
        }
        Ok(records)
    }

    /// The primary batch for a site and query, shared by both rankings.
    ///
    /// Single-flight on its own key, so concurrent searches with different
    /// rankings make one primary call between them.
    async fn primary(&self, website: &str, query: &str) -> Result<Vec<ResultRecord>, SearchError> {
        let key = primary_fingerprint(website, query);
        if let Some(records) = self.cache.get(&key).await {
            tracing::debug!(website, query, "primary batch served from cache");
            return Ok(records);
        }

        self.single_flight(&key, self.fetch_primary(&key, website, query)).await
    }

    async fn fetch_primary(&self, key: &str, website: &str, query: &str) -> Result<Vec<ResultRecord>, SearchError> {
        if let Some(records) = self.cache.get(key).await {
            tracing::debug!(website, query, "primary batch filled by a concurrent caller");
            return Ok(records);
        }

        self.provider
            .ensure_ready()
            .map_err(|e| provider_error(ExecutorError::Terminal(e)))?;
        self.quota.check_and_reserve()?;

        let max_results = self.settings.max_results.max(self.settings.enrich_top_n);
        let body = self
            .executor
            .execute("firecrawl.search", self.settings.timeout, self.settings.max_retries, || {
                self.provider.search(website, query, max_results)
            })
            .await
            .map_err(provider_error)?;

        let records = normalize(&body);
        self.store(key, &records).await;
        Ok(records)
    }

    /// Enrich the top candidates and order them by rating.
    ///
    /// The flag is false when any candidate kept its basic record because a
    /// detail lookup failed or was skipped.
    async fn enrich(&self, primary: Vec<ResultRecord>) -> (Vec<ResultRecord>, bool) {
        let candidates = primary.into_iter().take(self.settings.enrich_top_n);
        let outcomes = join_all(candidates.map(|candidate| self.enrich_one(candidate))).await;

        let settled = outcomes.iter().all(|outcome| matches!(outcome, Enrichment::Settled(_)));
        let mut records: Vec<_> = outcomes.into_iter().map(Enrichment::into_record).collect();
        sort_by_rating(&mut records);
        (records, settled)
    }

    /// Detail lookup for one candidate. Any failure keeps the basic record.
    async fn enrich_one(&self, basic: ResultRecord) -> Enrichment {
        if basic.url.is_empty() {
            return Enrichment::Settled(basic);
        }

        let key = detail_fingerprint(&basic.url);
        if let Some(detail) = self.cache.get(&key).await.and_then(|records| records.into_iter().next()) {
            return Enrichment::Settled(merge_detail(basic, detail));
        }

        if let Err(e) = self.provider.ensure_ready() {
            tracing::warn!(url = %basic.url, error = %e, "skipping enrichment");
            return Enrichment::Degraded(basic);
        }
        if let Err(e) = self.quota.check_and_reserve() {
            tracing::warn!(url = %basic.url, error = %e, "skipping enrichment");
            return Enrichment::Degraded(basic);
        }

        let outcome = self
            .executor
            .execute("firecrawl.detail", self.settings.timeout, self.settings.max_retries, || {
                self.provider.detail(&basic.url)
            })
            .await;
        let body = match outcome {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %basic.url, error = %e, "enrichment failed, keeping basic record");
                return Enrichment::Degraded(basic);
            }
        };

        match normalize_detail(&body, &basic.url) {
            Some(detail) => {
                self.store(&key, std::slice::from_ref(&detail)).await;
                Enrichment::Settled(merge_detail(basic, detail))
            }
            None => {
                tracing::debug!(url = %basic.url, "enrichment returned nothing usable");
                Enrichment::Settled(basic)
            }
        }
    }

    /// Write to the cache. Empty lists are not cached so the next call retries.
    async fn store(&self, key: &str, records: &[ResultRecord]) {
        if records.is_empty() {
            return;
        }
        if let Err(e) = self.cache.put(key, records.to_vec(), self.settings.cache_ttl).await {
            tracing::warn!(key, error = %e, "cache write degraded to fast tier");
        }
    }

    /// Run `work` while holding the flight slot for `key`.
    async fn single_flight<T>(&self, key: &str, work: impl Future<Output = T>) -> T {
        let slot = self.flight_slot(key);
        let result = {
            let _guard = slot.lock().await;
            work.await
        };
        self.release_flight_slot(key, slot);
        result
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flight_slot(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.lock_in_flight().entry(key.to_string()).or_default().clone()
    }

    fn release_flight_slot(&self, key: &str, slot: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.lock_in_flight();
        // map + this caller
        let idle = Arc::strong_count(&slot) <= 2;
        drop(slot);
        if idle {
            in_flight.remove(key);
        }
    }
}

/// Outcome of one candidate's detail lookup.
enum Enrichment {
    /// Detail merged in, or nothing more to fetch for this candidate.
    Settled(ResultRecord),
    /// Basic record kept after a failed or skipped lookup.
    Degraded(ResultRecord),
}

impl Enrichment {
    fn into_record(self) -> ResultRecord {
        match self {
            Enrichment::Settled(record) | Enrichment::Degraded(record) => record,
        }
    }
}

fn validate_input<'a>(website: &'a str, query: &'a str) -> Result<(&'a str, &'a str), SearchError> {
    let website = website.trim();
    let query = query.trim();
    if website.is_empty() {
        return Err(SearchError::InvalidInput("website cannot be empty".into()));
    }
    if query.is_empty() {
        return Err(SearchError::InvalidInput("query cannot be empty".into()));
    }
    Ok((website, query))
}

/// Map an executor outcome onto the caller-facing error.
fn provider_error(err: ExecutorError<FirecrawlError>) -> SearchError {
    match err {
        ExecutorError::Terminal(e) if e.is_auth() => SearchError::Auth(e.to_string()),
        ExecutorError::Terminal(FirecrawlError::InvalidRequest(msg)) => SearchError::InvalidInput(msg),
        ExecutorError::Terminal(e) => SearchError::Terminal(e.to_string()),
        ExecutorError::Exhausted { attempts, last } => {
            SearchError::Retryable(format!("{last} (after {attempts} attempts)"))
        }
        ExecutorError::TimedOut { attempts } => {
            SearchError::Retryable(format!("request timed out (after {attempts} attempts)"))
        }
        ExecutorError::Closed => SearchError::Terminal("executor closed".into()),
    }
}
