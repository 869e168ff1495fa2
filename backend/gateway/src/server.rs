//! HTTP gateway server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::info;

use innkeep_store::CacheStore;

use crate::webhook;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<CacheStore>,
    /// Shared token expected in webhook envelopes; None disables the check.
    pub webhook_token: Option<String>,
    /// Operator notices (new reservations) are pushed here for delivery.
    pub notices: Option<mpsc::Sender<String>>,
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/webhooks/pms", post(webhook::receive_pms_webhook))
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process shuts down.
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);
    info!(%addr, "Gateway HTTP server listening");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn stats(State(state): State<GatewayState>) -> Json<Value> {
    match state.store.stats().await {
        Ok(stats) => Json(serde_json::to_value(stats).unwrap_or_else(|_| json!({}))),
        Err(e) => Json(json!({"error": e.to_string()})),
    }
}
