//! Background search jobs with polled status.
//!
//! A job runs one search on the tokio runtime. Its status slot lives in a moka
//! cache and disappears after the configured TTL.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use bestof_core::{RankingType, ResultRecord, SearchError};

use super::SearchOrchestrator;

/// Upper bound on tracked jobs.
const MAX_JOBS: u64 = 10_000;

/// A search to run in the background.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub website: String,
    pub query: String,
    pub ranking: RankingType,
    /// Recorded in search history when set.
    pub user_id: Option<i64>,
}

/// Lifecycle of a background search.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Running { started_at: DateTime<Utc> },
    Completed { results: Vec<ResultRecord>, finished_at: DateTime<Utc> },
    Failed { error: SearchError, finished_at: DateTime<Utc> },
}

impl JobStatus {
    pub fn state(&self) -> &'static str {
        match self {
            JobStatus::Running { .. } => "running",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running { .. })
    }
}

/// Dispatches searches to the runtime and tracks their status.
#[derive(Clone)]
pub struct SearchJobs {
    orchestrator: Arc<SearchOrchestrator>,
    slots: Cache<Uuid, JobStatus>,
}

impl std::fmt::Debug for SearchJobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchJobs").field("tracked", &self.slots.entry_count()).finish()
    }
}

impl SearchJobs {
    /// Status slots expire `ttl` after their last write.
    pub fn new(orchestrator: Arc<SearchOrchestrator>, ttl: Duration) -> Self {
        let slots = Cache::builder().max_capacity(MAX_JOBS).time_to_live(ttl).build();
        Self { orchestrator, slots }
    }

    pub fn orchestrator(&self) -> &Arc<SearchOrchestrator> {
        &self.orchestrator
    }

    /// Spawn the search and return its id immediately.
    pub async fn start(&self, request: SearchRequest) -> Uuid {
        let id = Uuid::new_v4();
        self.slots.insert(id, JobStatus::Running { started_at: Utc::now() }).await;

        tracing::info!(job_id = %id, website = %request.website, query = %request.query, ranking = %request.ranking, "search job started");

        let orchestrator = self.orchestrator.clone();
        let slots = self.slots.clone();
        tokio::spawn(async move {
            let result = match request.user_id {
                Some(user_id) => {
                    orchestrator.search_for_user(user_id, &request.website, &request.query, request.ranking).await
                }
                None => orchestrator.search(&request.website, &request.query, request.ranking).await,
            };

            let finished_at = Utc::now();
            let status = match result {
                Ok(results) => JobStatus::Completed { results, finished_at },
                Err(error) => JobStatus::Failed { error, finished_at },
            };
            tracing::info!(job_id = %id, state = status.state(), "search job finished");
            slots.insert(id, status).await;
        });

        id
    }

    pub async fn status(&self, id: &Uuid) -> Option<JobStatus> {
        self.slots.get(id).await
    }

    /// The outcome of a finished job; `None` while running or when unknown.
    pub async fn result(&self, id: &Uuid) -> Option<Result<Vec<ResultRecord>, SearchError>> {
        match self.slots.get(id).await? {
            JobStatus::Running { .. } => None,
            JobStatus::Completed { results, .. } => Some(Ok(results)),
            JobStatus::Failed { error, .. } => Some(Err(error)),
        }
    }
}
