//! Social post API endpoints.

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::accounts::{self, AccountRepository};
use crate::db::social_posts::{PostStatus, SocialPost, SocialPostRepository};
use crate::db::users::UserRepository;
use crate::social::{PublishTarget, SocialPlatform};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", put(update_post).delete(delete_post))
        .route("/:id/publish", post(publish_post))
}

/// PUT /api/posts/:id - Replace a post's content.
async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<SocialPost>> {
    let post = state
        .db
        .call(move |conn| SocialPostRepository::update_content(conn, &user_id, &id, &req.content))
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;
    Ok(Json(post))
}

/// DELETE /api/posts/:id
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state
        .db
        .call(move |conn| SocialPostRepository::delete(conn, &user_id, &id))
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Post not found."));
    }
    Ok(Json(json!({ "success": true, "message": "Post deleted." })))
}

/// POST /api/posts/:id/publish - Publish to the post's network.
async fn publish_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SocialPost>> {
    let (uid, pid) = (user_id.clone(), id.clone());
    let post = state
        .db
        .call(move |conn| SocialPostRepository::get_for_user(conn, &uid, &pid))
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    if post.status == PostStatus::Published {
        return Err(ApiError::bad_request("Post is already published."));
    }

    let target = publish_target(&state, &user_id, post.platform).await?;
    let publisher = match post.platform {
        SocialPlatform::LinkedIn => &state.linkedin,
        SocialPlatform::Facebook => &state.facebook,
    };

    let remote_id = publisher
        .publish(&target, &post.content)
        .await
        .map_err(|e| {
            warn!("Publishing post {} to {} failed: {:#}", post.id, post.platform, e);
            ApiError::bad_gateway(format!("Failed to post to {}.", post.platform))
        })?;

    info!("Post {} published to {} as {}", post.id, post.platform, remote_id);

    let published = state
        .db
        .call(move |conn| {
            SocialPostRepository::mark_published(conn, &id, &remote_id)?;
            SocialPostRepository::get_for_user(conn, &user_id, &id)
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    Ok(Json(published))
}

async fn publish_target(
    state: &AppState,
    user_id: &str,
    platform: SocialPlatform,
) -> ApiResult<PublishTarget> {
    let uid = user_id.to_string();
    match platform {
        SocialPlatform::LinkedIn => {
            let account = state
                .db
                .call(move |conn| AccountRepository::find(conn, &uid, accounts::LINKEDIN))
                .await?;
            account
                .and_then(|a| {
                    Some(PublishTarget {
                        access_token: a.access_token?,
                        account_id: a.provider_account_id,
                    })
                })
                .ok_or_else(|| ApiError::bad_request("LinkedIn account not connected."))
        }
        SocialPlatform::Facebook => {
            let settings = state
                .db
                .call(move |conn| UserRepository::get(conn, &uid))
                .await?;
            match (
                settings.default_facebook_page_id,
                settings.facebook_page_access_token,
            ) {
                (Some(account_id), Some(access_token)) => Ok(PublishTarget {
                    account_id,
                    access_token,
                }),
                _ => Err(ApiError::bad_request("No default Facebook Page selected.")),
            }
        }
    }
}
