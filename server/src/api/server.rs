//! API server initialization

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::routes::{health, ingest, traces};
use crate::core::shutdown::ShutdownService;
use crate::domain::ingest::IngestPipeline;

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub pipeline: IngestPipeline,
    /// Static bearer key; None disables auth (local development)
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(pool: SqlitePool, api_key: Option<String>) -> Self {
        Self {
            pipeline: IngestPipeline::new(pool.clone()),
            pool,
            api_key,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/ingest", post(ingest::ingest))
        .route("/api/v1/traces/{trace_id}", get(traces::get_trace))
        .route(
            "/api/v1/traces/{trace_id}/spans",
            get(traces::list_trace_spans),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    state: AppState,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(state: AppState, host: String, port: u16) -> Self {
        Self { state, host, port }
    }

    /// Bind and serve until shutdown is triggered
    pub async fn serve(self, shutdown: ShutdownService) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        tracing::info!(%addr, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown.wait())
            .await
            .context("API server error")?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
