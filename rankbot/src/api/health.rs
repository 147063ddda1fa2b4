//! Liveness and health endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Entries in the role directory (0 until first load)
    pub roles_cached: usize,
    /// Whether the owner guard is armed
    pub owner_known: bool,
}

/// GET /
pub async fn root() -> &'static str {
    "Rank bot running"
}

/// GET /health
///
/// Does NOT require the shared secret.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "rankbot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        roles_cached: state.pipeline.roles().len().await,
        owner_known: state.pipeline.owner().owner().await.is_some(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
