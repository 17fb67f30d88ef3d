//! Card Key Validator - Main Application Entry Point
//!
//! A single HTTP endpoint that checks a license-style card key against a
//! remote store and reports whether it is usable right now.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Store**: PostgREST-style HTTP API via reqwest, or PostgreSQL via sqlx
//! - **Clock**: The store's own time, local time as fallback
//! - **Format**: JSON responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Build the card key store selected by the configuration
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port

mod app;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    app::AppState,
    config::Config,
    store::{CardKeyStore, PgCardKeyStore, RestCardKeyStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = build_store(&config)?;

    let app = app::build_router(AppState::new(store));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the store backend.
///
/// `DATABASE_URL` selects direct PostgreSQL access; otherwise the REST store
/// is used, possibly unconfigured, in which case every lookup fails.
fn build_store(config: &Config) -> anyhow::Result<Arc<dyn CardKeyStore>> {
    if let Some(database_url) = Config::non_empty(&config.database_url) {
        let pool = db::create_pool(database_url)?;
        tracing::info!("Using PostgreSQL card key store");
        return Ok(Arc::new(PgCardKeyStore::new(pool)));
    }

    let base_url = Config::non_empty(&config.store_url);
    let api_key = Config::non_empty(&config.store_key);
    if base_url.is_none() || api_key.is_none() {
        tracing::warn!("STORE_URL or STORE_KEY missing, every lookup will fail");
    } else {
        tracing::info!("Using REST card key store");
    }

    Ok(Arc::new(RestCardKeyStore::new(base_url, api_key)?))
}
