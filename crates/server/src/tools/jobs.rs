//! search_start and search_status tool implementations.
//!
//! A started search runs in the background; its status is polled by id.

use chrono::{DateTime, Utc};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bestof_client::{JobStatus, SearchJobs, SearchRequest};
use bestof_core::{Error, ResultRecord};

use super::{BestSearchParams, json_result};

/// Output from the search_start tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchStartOutput {
    /// Id to pass to search_status.
    pub job_id: String,
    pub state: String,
}

/// Parameters for the search_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchStatusParams {
    /// Id returned by search_start.
    pub job_id: String,
}

/// Output from the search_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchStatusOutput {
    pub job_id: String,
    /// "running", "completed" or "failed".
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether retrying the same search later may succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_later: Option<bool>,
}

impl SearchStatusOutput {
    fn new(job_id: String, status: JobStatus) -> Self {
        let state = status.state().to_string();
        let mut output = Self {
            job_id,
            state,
            started_at: None,
            finished_at: None,
            results: None,
            error: None,
            retry_later: None,
        };

        match status {
            JobStatus::Running { started_at } => output.started_at = Some(started_at),
            JobStatus::Completed { results, finished_at } => {
                output.finished_at = Some(finished_at);
                output.results = Some(results);
            }
            JobStatus::Failed { error, finished_at } => {
                output.finished_at = Some(finished_at);
                output.retry_later = Some(error.is_transient());
                output.error = Some(error.to_string());
            }
        }
        output
    }
}

/// Implementation of the search_start tool.
pub async fn start_impl(jobs: &SearchJobs, params: BestSearchParams) -> Result<CallToolResult, McpError> {
    let ranking = params.ranking()?;

    if params.website.trim().is_empty() || params.query.trim().is_empty() {
        return Err(Error::InvalidInput("website and query cannot be empty".into()).into());
    }

    let request = SearchRequest { website: params.website, query: params.query, ranking, user_id: params.user_id };
    let id = jobs.start(request).await;

    json_result(&SearchStartOutput { job_id: id.to_string(), state: "running".into() })
}

/// Implementation of the search_status tool.
pub async fn status_impl(jobs: &SearchJobs, params: SearchStatusParams) -> Result<CallToolResult, McpError> {
    let id = Uuid::parse_str(params.job_id.trim())
        .map_err(|e| Error::InvalidInput(format!("invalid job id {}: {e}", params.job_id)))?;

    let status = jobs
        .status(&id)
        .await
        .ok_or_else(|| Error::JobNotFound(params.job_id.clone()))?;

    json_result(&SearchStatusOutput::new(id.to_string(), status))
}
