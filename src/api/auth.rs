//! Caller identity.
//!
//! Sessions are owned by the identity layer in front of this service, which
//! forwards the authenticated user id in a header.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user. Rejects with 401 when the header is missing.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CurrentUser(id.to_string()))
            .ok_or_else(ApiError::unauthorized)
    }
}
