//! Per-user settings.

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::users::UserRepository;
use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub bot_join_offset_minutes: i64,
    pub default_facebook_page_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub bot_join_offset_minutes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookPageRequest {
    pub page_id: String,
    pub page_access_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).post(update_settings))
        .route("/facebook-page", post(set_facebook_page))
}

/// GET /api/settings
async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<SettingsResponse>> {
    let settings = state
        .db
        .call(move |conn| UserRepository::get(conn, &user_id))
        .await?;

    Ok(Json(SettingsResponse {
        bot_join_offset_minutes: settings
            .bot_join_offset_minutes
            .unwrap_or_else(|| state.scheduler.default_offset_minutes()),
        default_facebook_page_id: settings.default_facebook_page_id,
    }))
}

/// POST /api/settings
async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<Value>> {
    let minutes = req.bot_join_offset_minutes;
    if minutes < 0 {
        return Err(ApiError::bad_request(
            "botJoinOffsetMinutes must be zero or more.",
        ));
    }

    state
        .db
        .call(move |conn| UserRepository::set_join_offset(conn, &user_id, minutes))
        .await?;

    Ok(Json(json!({ "success": true, "botJoinOffsetMinutes": minutes })))
}

/// POST /api/settings/facebook-page - Choose the page posts go to.
async fn set_facebook_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<FacebookPageRequest>,
) -> ApiResult<Json<Value>> {
    let page_id = req.page_id.trim().to_string();
    let token = req.page_access_token.trim().to_string();
    if page_id.is_empty() || token.is_empty() {
        return Err(ApiError::bad_request("pageId and pageAccessToken are required."));
    }

    state
        .db
        .call(move |conn| UserRepository::set_facebook_page(conn, &user_id, &page_id, &token))
        .await?;

    Ok(Json(json!({ "success": true, "message": "Default Facebook Page saved." })))
}
