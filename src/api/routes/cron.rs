//! Polling trigger.

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::warn;

pub fn router() -> Router<AppState> {
    Router::new().route("/poll", get(poll))
}

/// GET /api/cron/poll - Run one sweep.
async fn poll(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    if let Some(secret) = state.cron_secret.as_deref() {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(secret) {
            warn!("Rejected polling trigger with missing or wrong secret");
            return Err(ApiError::unauthorized());
        }
    }

    // The sweep logs its own failure.
    let report = state
        .reconciler
        .sweep()
        .await
        .map_err(|_| ApiError::internal("An internal server error occurred."))?;

    Ok(Json(json!({
        "success": true,
        "polled": report.polled,
        "advanced": report.transitions.len(),
        "errors": report.errors,
        "transitions": report.transitions,
    })))
}
