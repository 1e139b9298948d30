//! Polling log API routes.

use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::db::cron_logs::{CronLog, CronLogRepository, DEFAULT_LIMIT};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

/// Query parameters for logs.
#[derive(Debug, Deserialize, Default)]
pub struct LogsQueryParams {
    /// Number of log entries (default 100)
    pub lines: Option<usize>,
}

/// Create the logs router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_logs))
}

/// GET /api/admin/logs - Most recent sweep records, newest first.
async fn get_logs(
    State(state): State<AppState>,
    Query(params): Query<LogsQueryParams>,
) -> ApiResult<Json<Vec<CronLog>>> {
    let limit = params.lines.unwrap_or(DEFAULT_LIMIT);
    let logs = state
        .db
        .call(move |conn| CronLogRepository::list(conn, limit))
        .await?;
    Ok(Json(logs))
}
