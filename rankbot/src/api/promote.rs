//! Progression update endpoint
//!
//! `POST /update-xp` and `POST /promote` are aliases. The body is
//! `{userId, xp, loaded, secret}`; a body that is not JSON is treated as an
//! empty object and therefore fails authentication.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use rankbot_common::api::{ErrorKind, PromotionOutcome, PromotionRequest, PromotionResponse};
use std::sync::Arc;
use tracing::{debug, error};

use crate::AppState;

/// POST /update-xp, POST /promote
pub async fn submit_progression(
    State(state): State<AppState>,
    payload: Result<Json<PromotionRequest>, JsonRejection>,
) -> (StatusCode, Json<PromotionResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Unparseable request body, treating as empty");
            PromotionRequest::default()
        }
    };

    // Run detached so a dropped connection cannot cancel an in-flight write
    let pipeline = Arc::clone(&state.pipeline);
    let outcome = match tokio::spawn(async move { pipeline.submit(request).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Promotion task failed");
            PromotionOutcome::failed(ErrorKind::InternalError, e.to_string())
        }
    };

    let status =
        StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.to_response()))
}

/// Build promotion routes
pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/update-xp", post(submit_progression))
        .route("/promote", post(submit_progression))
}
