//! Tagout Persistence Server
//!
//! Serves annotations, isolation plans and isolation points over HTTP.
//! The acting user comes from the `x-user-id`, `x-user-name` and
//! `x-user-role` headers set by an upstream gateway; every write is
//! re-checked against that role and the plan workflow.

mod config;
mod error;
mod extract;
mod handlers;
mod routes;

use anyhow::Context;
use tagout_core::storage::MemoryStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).context("invalid TAGOUT_LOG filter")?)
        .init();

    let app = routes::router(AppState::new(MemoryStore::new()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Tagout server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
