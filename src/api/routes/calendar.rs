//! Calendar listing with per-event recording state.

use std::collections::HashMap;

use crate::api::auth::CurrentUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::calendar::CalendarEvent;
use crate::db::accounts::{self, AccountRepository};
use crate::db::meetings::{Meeting, MeetingRepository};
use crate::meeting::{MeetingStatus, Platform};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub is_recording_enabled: bool,
    pub meeting_link: Option<String>,
    pub platform: Option<Platform>,
    pub status: Option<MeetingStatus>,
    pub meeting_id: Option<String>,
}

impl EventView {
    fn new(event: CalendarEvent, meeting: Option<&Meeting>) -> Self {
        let detected = event.meeting_info();
        match meeting {
            Some(m) => Self {
                is_recording_enabled: m.recording_enabled,
                meeting_link: m
                    .meeting_link
                    .clone()
                    .or_else(|| detected.as_ref().map(|i| i.link.clone())),
                platform: Some(m.platform),
                status: Some(m.status),
                meeting_id: Some(m.id.clone()),
                event,
            },
            None => Self {
                is_recording_enabled: false,
                meeting_link: detected.as_ref().map(|i| i.link.clone()),
                platform: detected.map(|i| i.platform),
                status: None,
                meeting_id: None,
                event,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub events: Vec<EventView>,
    pub next_page_token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(list_events))
}

/// GET /api/calendar/events - Upcoming events, one page at a time.
async fn list_events(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<EventsResponse>> {
    let uid = user_id.clone();
    let token = state
        .db
        .call(move |conn| AccountRepository::find(conn, &uid, accounts::GOOGLE))
        .await?
        .and_then(|a| a.access_token)
        .ok_or_else(|| ApiError::not_found("Google account not connected."))?;

    let page = state
        .calendar
        .list_upcoming(&token, query.page_token.as_deref())
        .await
        .map_err(|e| {
            warn!("Calendar listing failed for user {}: {:#}", user_id, e);
            ApiError::bad_gateway("Failed to fetch calendar events.")
        })?;

    let event_ids: Vec<String> = page.items.iter().map(|e| e.id.clone()).collect();
    let meetings = state
        .db
        .call(move |conn| MeetingRepository::find_by_events(conn, &user_id, &event_ids))
        .await?;
    let by_event: HashMap<&str, &Meeting> = meetings
        .iter()
        .map(|m| (m.external_event_id.as_str(), m))
        .collect();

    let events = page
        .items
        .into_iter()
        .map(|event| {
            let meeting = by_event.get(event.id.as_str()).copied();
            EventView::new(event, meeting)
        })
        .collect();

    Ok(Json(EventsResponse {
        events,
        next_page_token: page.next_page_token,
    }))
}
