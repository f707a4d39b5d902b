//! Client code for bestof.
//!
//! This crate provides the Firecrawl extract client, the bounded executor for
//! outbound calls, response normalization, and the search orchestrator shared
//! by the server.

pub mod executor;
pub mod firecrawl;
pub mod normalize;
pub mod provider;
pub mod search;

pub use executor::{BoundedExecutor, ExecutorConfig, ExecutorError, MemoryProbe, ProcMemoryProbe, Retryable};
pub use firecrawl::{ExtractRequest, FirecrawlClient, FirecrawlConfig, FirecrawlError, LazyFirecrawlClient};
pub use normalize::{ResponseShape, normalize, normalize_detail};
pub use provider::ExtractProvider;
pub use search::{JobStatus, SearchJobs, SearchOrchestrator, SearchRequest, SearchSettings};
