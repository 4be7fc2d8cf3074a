//! swcache server entry point.
//!
//! Loads configuration, opens the cache store, deploys the configured
//! version and serves the engine over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig, Fetcher, OfflineCache};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
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
        db_path = %config.db_path.display(),
        generation = %config.generation_name(),
        "Starting swcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Fetcher> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let cache = Arc::new(OfflineCache::new(db, network, &config).await?);

    match cache.lifecycle().deploy().await {
        Ok(outcome) => tracing::info!(?outcome, "startup deploy finished"),
        Err(e) => tracing::error!(error = %e, "startup deploy failed; serving from prior generation"),
    }

    if let Some(mut tags) = cache.take_sync_tags() {
        tokio::spawn(async move {
            while let Some(tag) = tags.recv().await {
                tracing::info!(tag = %tag, "background sync delegated to host");
            }
        });
    }

    let handler = handler::SwCacheServer::new(cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
