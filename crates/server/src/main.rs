//! bestof server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bestof_client::SearchOrchestrator;
use bestof_core::{AppConfig, CacheDb};

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        profile = ?config.profile,
        plan = ?config.plan,
        daily_limit = config.effective_daily_limit(),
        db_path = %config.db_path.display(),
        "Starting bestof server on stdio transport"
    );

    if let Err(e) = config.require_firecrawl_api_key() {
        tracing::warn!(error = %e, "no Firecrawl API key, searches that miss the cache will fail");
    }

    let db = open_database(&config).await;
    let orchestrator = Arc::new(SearchOrchestrator::from_config(&config, db));

    let handler = handler::BestofServer::new(orchestrator, config.job_ttl());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

/// Open the SQLite database, falling back to the in-process cache tier alone.
async fn open_database(config: &AppConfig) -> Option<CacheDb> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!(path = %parent.display(), error = %e, "cannot create database directory");
    }

    match CacheDb::open(&config.db_path).await {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::warn!(error = %e, "durable cache unavailable, running with in-process cache only");
            None
        }
    }
}
