//! Meeting API endpoints.
//!
//! Provides HTTP endpoints for:
//! - Listing completed meetings (GET /api/meetings)
//! - Getting a meeting with its rendered transcript (GET /api/meetings/:id)
//! - Turning recording on or off for a calendar event (POST /api/meetings/toggle)
//! - Cancelling a recording (POST /api/meetings/cancel)
//! - Listing and clearing a meeting's social posts

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::calendar::CalendarEvent;
use crate::db::meetings::{Meeting, MeetingRepository};
use crate::db::social_posts::{SocialPost, SocialPostRepository};
use crate::meeting::{MeetingInfo, Platform};
use crate::normalizer;
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub event: CalendarEvent,
    pub is_enabled: bool,
    pub link: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(alias = "googleEventId")]
    pub external_event_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDetail {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub normalized_transcript: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meetings))
        .route("/toggle", post(toggle_recording))
        .route("/cancel", post(cancel_recording))
        .route("/:id", get(get_meeting))
        .route("/:id/posts", get(list_posts))
        .route("/:id/posts/draft", delete(delete_drafts))
}

/// GET /api/meetings - Completed meetings, most recent first.
async fn list_meetings(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Meeting>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let meetings = state
        .db
        .call(move |conn| MeetingRepository::list_completed(conn, &user_id, limit))
        .await?;
    Ok(Json(meetings))
}

/// GET /api/meetings/:id
async fn get_meeting(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MeetingDetail>> {
    let meeting = load_meeting(&state, user_id, id).await?;
    let normalized_transcript = normalizer::normalize(meeting.transcript.as_deref());
    Ok(Json(MeetingDetail {
        meeting,
        normalized_transcript,
    }))
}

/// POST /api/meetings/toggle
async fn toggle_recording(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<ToggleRequest>,
) -> ApiResult<Json<Value>> {
    if !req.is_enabled {
        let meeting = state
            .scheduler
            .cancel_recording(&user_id, &req.event.id)
            .await?;
        return Ok(Json(json!({ "success": true, "meeting": meeting })));
    }

    let info = match req.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(link) => {
            let mut info = MeetingInfo::from_link(link);
            if let Some(platform) = req.platform.as_deref() {
                info.platform = Platform::parse(platform);
            }
            info
        }
        None => req
            .event
            .meeting_info()
            .ok_or_else(|| ApiError::bad_request("No meeting link found for this event."))?,
    };

    info!(
        "Enabling recording for event {} on {}",
        req.event.id,
        info.platform.as_str()
    );

    let meeting = state
        .scheduler
        .enable_recording(&user_id, &req.event, &info.link, info.platform)
        .await?;

    Ok(Json(json!({ "success": true, "meeting": meeting })))
}

/// POST /api/meetings/cancel
async fn cancel_recording(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CancelRequest>,
) -> ApiResult<Json<Value>> {
    state
        .scheduler
        .cancel_recording(&user_id, &req.external_event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Meeting not found."))?;

    Ok(Json(json!({ "success": true, "message": "Recording canceled." })))
}

/// GET /api/meetings/:id/posts
async fn list_posts(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SocialPost>>> {
    let posts = state
        .db
        .call(move |conn| SocialPostRepository::list_for_meeting(conn, &user_id, &id))
        .await?;
    Ok(Json(posts))
}

/// DELETE /api/meetings/:id/posts/draft
async fn delete_drafts(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let meeting = load_meeting(&state, user_id.clone(), id).await?;
    let deleted = state
        .db
        .call(move |conn| SocialPostRepository::delete_drafts(conn, &user_id, &meeting.id))
        .await?;

    Ok(Json(json!({ "success": true, "deletedCount": deleted })))
}

pub(crate) async fn load_meeting(
    state: &AppState,
    user_id: String,
    id: String,
) -> ApiResult<Meeting> {
    state
        .db
        .call(move |conn| MeetingRepository::get_for_user(conn, &user_id, &id))
        .await?
        .ok_or_else(|| ApiError::not_found("Meeting not found."))
}
