//! Automation API endpoints.
//!
//! An automation is a saved prompt that turns a transcript into a social post
//! for one network.

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::automations::{Automation, AutomationInput, AutomationRepository};
use crate::social::SocialPlatform;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct AutomationRequest {
    pub name: String,
    pub platform: String,
    pub prompt: String,
    #[serde(default)]
    pub example: Option<String>,
}

impl AutomationRequest {
    fn validate(self) -> ApiResult<AutomationInput> {
        let name = self.name.trim().to_string();
        let prompt = self.prompt.trim().to_string();
        if name.is_empty() || prompt.is_empty() {
            return Err(ApiError::bad_request("name and prompt are required."));
        }
        let platform = SocialPlatform::parse(&self.platform)
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        Ok(AutomationInput {
            name,
            platform,
            prompt,
            example: self.example.filter(|e| !e.trim().is_empty()),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_automations).post(create_automation))
        .route("/:id", put(update_automation).delete(delete_automation))
}

async fn list_automations(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<Automation>>> {
    let automations = state
        .db
        .call(move |conn| AutomationRepository::list(conn, &user_id))
        .await?;
    Ok(Json(automations))
}

async fn create_automation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<AutomationRequest>,
) -> ApiResult<Json<Automation>> {
    let input = req.validate()?;
    let automation = state
        .db
        .call(move |conn| AutomationRepository::create(conn, &user_id, &input))
        .await?;
    Ok(Json(automation))
}

async fn update_automation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AutomationRequest>,
) -> ApiResult<Json<Automation>> {
    let input = req.validate()?;
    let automation = state
        .db
        .call(move |conn| AutomationRepository::update(conn, &user_id, &id, &input))
        .await?
        .ok_or_else(|| ApiError::not_found("Automation not found."))?;
    Ok(Json(automation))
}

async fn delete_automation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state
        .db
        .call(move |conn| AutomationRepository::delete(conn, &user_id, &id))
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Automation not found."));
    }
    Ok(Json(json!({ "success": true })))
}
