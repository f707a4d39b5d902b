//! Firecrawl extract request types and validation.

use serde::Serialize;
use serde_json::{Value, json};

use bestof_core::cache::hash::normalize_website;

use crate::firecrawl::FirecrawlError;

/// Maximum prompt length accepted before sending.
const MAX_PROMPT_CHARS: usize = 4_000;

/// Body of `POST /v1/extract`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Target URLs; a trailing `/*` lets Firecrawl crawl the whole site.
    pub urls: Vec<String>,

    /// Natural-language instruction for the extraction model.
    pub prompt: String,

    /// JSON schema the extracted data should follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Let Firecrawl follow links outside the target when needed.
    pub enable_web_search: bool,

    /// Include source URLs in the response.
    pub show_sources: bool,
}

impl ExtractRequest {
    /// Primary search: the top `max_results` matches for `query` on `website`.
    pub fn primary_search(website: &str, query: &str, max_results: usize) -> Self {
        let site = normalize_website(website);
        let prompt = format!(
            "Find the top {max_results} results for \"{query}\" on {site}. For each result, provide:\n\
             1. A clear title\n\
             2. A brief description\n\
             3. The rating if available (number between 0 and 5)\n\
             4. The URL of the page\n\
             5. The image URL if available"
        );

        Self {
            urls: vec![format!("https://{site}/*")],
            prompt,
            schema: Some(primary_schema()),
            enable_web_search: true,
            show_sources: false,
        }
    }

    /// Detail pass for a single candidate page.
    pub fn detail(url: &str) -> Self {
        let prompt = "Analyze this page and its user comments. Provide:\n\
             1. The title\n\
             2. A detailed summary\n\
             3. What makes this one unique (the big difference)\n\
             4. Key takeaways\n\
             5. Pros and cons mentioned by reviewers\n\
             6. Tips and tricks\n\
             7. The rating if available (number between 0 and 5)\n\
             8. The image URL if available"
            .to_string();

        Self {
            urls: vec![url.trim().to_string()],
            prompt,
            schema: Some(detail_schema()),
            enable_web_search: false,
            show_sources: false,
        }
    }

    /// Validate the request before it is sent.
    pub fn validate(&self) -> Result<(), FirecrawlError> {
        if self.urls.is_empty() {
            return Err(FirecrawlError::InvalidRequest("at least one target URL is required".into()));
        }

        for target in &self.urls {
            let parsed = url::Url::parse(target)
                .map_err(|e| FirecrawlError::InvalidRequest(format!("invalid target URL {target}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(FirecrawlError::InvalidRequest(format!("unsupported target URL: {target}")));
            }
        }

        if self.prompt.trim().is_empty() {
            return Err(FirecrawlError::InvalidRequest("prompt cannot be empty".into()));
        }

        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(FirecrawlError::InvalidRequest(format!(
                "prompt too long: {} chars (max {MAX_PROMPT_CHARS})",
                self.prompt.chars().count()
            )));
        }

        Ok(())
    }
}

fn primary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "rating": { "type": "number" },
                        "url": { "type": "string" },
                        "imageUrl": { "type": "string" }
                    },
                    "required": ["title", "url"]
                }
            }
        },
        "required": ["results"]
    })
}

fn detail_schema() -> Value {
    let list = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "rating": { "type": "number" },
            "imageUrl": { "type": "string" },
            "bigDifference": { "type": "string" },
            "keyTakeaways": list,
            "commentSummary": {
                "type": "object",
                "properties": {
                    "summary": { "type": "string" },
                    "pros": list,
                    "cons": list,
                    "tips": list
                }
            }
        },
        "required": ["title"]
    })
}
