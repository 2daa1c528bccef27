//! HTTP API over the ledger service.

mod documents;
mod error;
mod health;
mod ledger;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::LedgerService;

pub use error::{ApiResult, ErrorBody};
pub use ledger::{CreateEntryRequest, EntryView, LedgerParams, LedgerResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
}

impl AppState {
    pub fn new(service: LedgerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ledger::create))
        .route("/supplier", get(ledger::supplier))
        .route("/customer", get(ledger::customer))
        .route("/{party_type}/{party_id}/balance", get(ledger::balance))
}

/// Build the application router with middleware and state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/ledger", ledger_routes())
        .route("/api/documents/{kind}/next-number", post(documents::next_number))
        .route("/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until Ctrl-C.
pub async fn serve(service: LedgerService, addr: SocketAddr) -> Result<()> {
    let app = build_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("khata HTTP listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("khata HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
