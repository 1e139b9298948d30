//! Follow-up content generation.

use std::sync::Arc;

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::meetings::load_meeting;
use crate::api::AppState;
use crate::db::automations::AutomationRepository;
use crate::db::social_posts::{SocialPost, SocialPostRepository};
use crate::generation::{prompts, TextGenerator};
use crate::normalizer;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub transcript: Option<String>,
    pub meeting_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPostRequest {
    pub automation_id: String,
    pub meeting_id: String,
    pub transcript: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/email", post(generate_email))
        .route("/social-post", post(generate_social_post))
}

fn generator(state: &AppState) -> ApiResult<Arc<dyn TextGenerator>> {
    state
        .generator
        .clone()
        .ok_or_else(|| ApiError::unavailable("Text generation is not configured."))
}

/// Caller-supplied transcript text, else the meeting's rendered transcript.
async fn transcript_text(
    state: &AppState,
    user_id: &str,
    transcript: Option<String>,
    meeting_id: Option<String>,
) -> ApiResult<String> {
    if let Some(text) = transcript.filter(|t| !t.trim().is_empty()) {
        return Ok(text);
    }
    let meeting_id = meeting_id.ok_or_else(|| ApiError::bad_request("Transcript is required."))?;
    let meeting = load_meeting(state, user_id.to_string(), meeting_id).await?;
    if meeting.transcript.is_none() {
        return Err(ApiError::bad_request("Meeting has no transcript yet."));
    }
    Ok(normalizer::normalize(meeting.transcript.as_deref()))
}

/// POST /api/generate/email
async fn generate_email(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<Value>> {
    let generator = generator(&state)?;
    let transcript = transcript_text(&state, &user_id, req.transcript, req.meeting_id).await?;

    let email = generator
        .generate(&prompts::follow_up_email(&transcript))
        .await
        .map_err(|e| {
            warn!("Email generation failed: {:#}", e);
            ApiError::bad_gateway("Failed to generate email.")
        })?;

    Ok(Json(json!({ "email": email })))
}

/// POST /api/generate/social-post - Generate and store a draft.
async fn generate_social_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<SocialPostRequest>,
) -> ApiResult<Json<SocialPost>> {
    let generator = generator(&state)?;

    let (uid, automation_id) = (user_id.clone(), req.automation_id.clone());
    let automation = state
        .db
        .call(move |conn| AutomationRepository::get_for_user(conn, &uid, &automation_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Automation not found."))?;

    // Ownership check even when the transcript is supplied inline.
    let meeting = load_meeting(&state, user_id.clone(), req.meeting_id.clone()).await?;
    let transcript =
        transcript_text(&state, &user_id, req.transcript, Some(meeting.id.clone())).await?;

    let prompt = prompts::social_post(
        &automation.prompt,
        automation.example.as_deref(),
        &transcript,
    );
    let content = generator.generate(&prompt).await.map_err(|e| {
        warn!("Social post generation failed: {:#}", e);
        ApiError::bad_gateway("Failed to generate post.")
    })?;

    let platform = automation.platform;
    let post = state
        .db
        .call(move |conn| SocialPostRepository::create(conn, &meeting.id, platform, &content))
        .await?;

    info!(
        "Drafted {} post {} from automation {}",
        post.platform, post.id, automation.id
    );
    Ok(Json(post))
}
