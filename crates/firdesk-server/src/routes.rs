use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use firdesk_ai::{IncidentReport, TriageOutcome};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct TriageRequest {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub questions: usize,
    pub started_at: DateTime<Utc>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/classify", post(classify))
        .route("/triage", post(triage))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = tokio::task::spawn_blocking(move || state.matcher.reply(&req.message)).await??;
    if reply.is_fallback() {
        warn!("no FAQ match above threshold, sent fallback reply");
    }
    Ok(Json(ChatResponse { reply: reply.text }))
}

async fn classify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<IncidentReport>, ApiError> {
    let report =
        tokio::task::spawn_blocking(move || state.incidents.classify(&req.description)).await??;
    Ok(Json(report))
}

async fn triage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TriageRequest>,
) -> Result<Json<TriageOutcome>, ApiError> {
    if req.description.trim().is_empty() {
        return Err(ApiError::BadRequest("Please provide a description".into()));
    }
    let outcome = tokio::task::spawn_blocking(move || state.triage.run(&req.description)).await??;
    Ok(Json(outcome))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        questions: state.matcher.len(),
        started_at: state.started_at,
    })
}
