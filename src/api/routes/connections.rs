//! Linked provider accounts.

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::accounts::AccountRepository;
use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct Connection {
    pub provider: String,
}

#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    pub provider: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_connections))
        .route("/disconnect", post(disconnect))
}

/// GET /api/connections
async fn list_connections(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<Connection>>> {
    let providers = state
        .db
        .call(move |conn| AccountRepository::list_providers(conn, &user_id))
        .await?;
    Ok(Json(
        providers
            .into_iter()
            .map(|provider| Connection { provider })
            .collect(),
    ))
}

/// POST /api/connections/disconnect
async fn disconnect(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<DisconnectRequest>,
) -> ApiResult<Json<Value>> {
    let provider = req.provider.trim().to_lowercase();
    if provider.is_empty() {
        return Err(ApiError::bad_request("Provider is required."));
    }

    let (uid, p) = (user_id.clone(), provider.clone());
    let removed = state
        .db
        .call(move |conn| AccountRepository::remove(conn, &uid, &p))
        .await?;
    if !removed {
        return Err(ApiError::not_found(format!("No {} account connected.", provider)));
    }

    info!("User {} disconnected {}", user_id, provider);
    Ok(Json(json!({
        "success": true,
        "message": format!("Disconnected {}.", provider),
    })))
}
