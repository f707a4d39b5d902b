//! Firecrawl extract response envelope.
//!
//! Firecrawl answers either with the extracted data inline or with the id of
//! an asynchronous job that has to be polled. The payload itself is left as
//! raw JSON; its shape varies and is handled by the normalizer.

use serde::Deserialize;
use serde_json::Value;

/// Envelope fields shared by inline and job responses.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the client should do with a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    /// Data is present; hand the whole body to the normalizer.
    Ready(Value),
    /// Job accepted or still running; poll again.
    Pending { id: String },
    /// Job finished without data.
    Failed { id: String, status: String },
}

impl ExtractOutcome {
    /// Classify a response body.
    ///
    /// Bodies that are not envelopes at all (a bare list, an object without
    /// `success`/`id`/`status`) are treated as ready data.
    pub fn from_body(body: Value) -> Self {
        let envelope: ExtractEnvelope = match &body {
            Value::Object(_) => serde_json::from_value(body.clone()).unwrap_or_default(),
            _ => return ExtractOutcome::Ready(body),
        };

        let status = envelope.status.as_deref().map(str::to_ascii_lowercase);
        let has_data = envelope.data.as_ref().is_some_and(|d| !d.is_null());

        match (status.as_deref(), envelope.id) {
            (Some(s @ ("failed" | "cancelled")), id) => {
                ExtractOutcome::Failed { id: id.unwrap_or_default(), status: s.to_string() }
            }
            (Some("processing" | "pending" | "queued"), Some(id)) => ExtractOutcome::Pending { id },
            (None, Some(id)) if !has_data && envelope.success != Some(false) => ExtractOutcome::Pending { id },
            _ => ExtractOutcome::Ready(body),
        }
    }
}

/// Pull a human-readable message out of an error body.
pub fn error_message(body: &Value) -> String {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_data_is_ready() {
        let body = json!({"success": true, "data": {"results": [{"title": "A", "url": "https://a.com"}]}});
        assert_eq!(ExtractOutcome::from_body(body.clone()), ExtractOutcome::Ready(body));
    }

    #[test]
    fn test_job_id_without_data_is_pending() {
        let body = json!({"success": true, "id": "job-1"});
        assert_eq!(ExtractOutcome::from_body(body), ExtractOutcome::Pending { id: "job-1".into() });

        let body = json!({"success": true, "id": "job-1", "status": "processing"});
        assert_eq!(ExtractOutcome::from_body(body), ExtractOutcome::Pending { id: "job-1".into() });
    }

    #[test]
    fn test_completed_job_is_ready() {
        let body = json!({"success": true, "id": "job-1", "status": "completed", "data": {"title": "A"}});
        assert!(matches!(ExtractOutcome::from_body(body), ExtractOutcome::Ready(_)));
    }

    #[test]
    fn test_failed_job() {
        let body = json!({"success": false, "id": "job-1", "status": "failed", "error": "boom"});
        assert_eq!(
            ExtractOutcome::from_body(body),
            ExtractOutcome::Failed { id: "job-1".into(), status: "failed".into() }
        );
    }

    #[test]
    fn test_bare_list_is_ready() {
        let body = json!([{"title": "A"}]);
        assert!(matches!(ExtractOutcome::from_body(body), ExtractOutcome::Ready(_)));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(&json!({"error": "Unauthorized"})), "Unauthorized");
        assert_eq!(error_message(&json!({"message": "slow down"})), "slow down");
        assert_eq!(error_message(&json!("raw")), "\"raw\"");
    }
}
