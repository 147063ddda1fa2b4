//! rankbot library - XP to group rank bridge
//!
//! Receives progression updates from game servers and keeps each player's
//! group role in line with their XP tier.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod lease;
pub mod membership;
pub mod owner;
pub mod pipeline;
pub mod remote;
pub mod retry;
pub mod roles;

pub use config::BridgeConfig;
pub use pipeline::PromotionPipeline;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PromotionPipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<PromotionPipeline>) -> Self {
        Self {
            pipeline,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::promotion_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
