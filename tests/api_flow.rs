//! End-to-end tests for the HTTP API.
//!
//! The router runs in-process against an in-memory database; every external
//! provider (recording bots, calendar, generation, social networks) is a
//! wiremock server.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use meetscribe::api::{ApiServer, AppState};
use meetscribe::calendar::GoogleCalendarClient;
use meetscribe::config::{CalendarConfig, GenerationConfig, RecallConfig, SocialConfig};
use meetscribe::db::accounts::{self, AccountRepository, LinkedAccount};
use meetscribe::db::meetings::{MeetingRepository, RecordingRequest};
use meetscribe::db::Database;
use meetscribe::generation::GeminiClient;
use meetscribe::meeting::{MeetingStatus, Platform};
use meetscribe::recall::{BotLifecycleClient, RecallClient};
use meetscribe::reconcile::{Reconciler, SweepOptions};
use meetscribe::scheduler::RecordingScheduler;
use meetscribe::social::{FacebookPublisher, LinkedInPublisher};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "user-1";

fn state(server: &MockServer, db: Database) -> AppState {
    let recall = RecallConfig {
        base_url: server.uri(),
        ..RecallConfig::default()
    };
    let bots: Arc<dyn BotLifecycleClient> =
        Arc::new(RecallClient::new("test-key".to_string(), &recall).unwrap());
    let social = SocialConfig {
        linkedin_base_url: server.uri(),
        facebook_base_url: server.uri(),
        ..SocialConfig::default()
    };
    let generation = GenerationConfig {
        api_key: Some("gen-key".to_string()),
        base_url: server.uri(),
        ..GenerationConfig::default()
    };
    let calendar = CalendarConfig {
        base_url: server.uri(),
        ..CalendarConfig::default()
    };

    AppState {
        reconciler: Arc::new(Reconciler::new(
            db.clone(),
            bots.clone(),
            SweepOptions::default(),
        )),
        scheduler: Arc::new(RecordingScheduler::new(db.clone(), bots, 5)),
        calendar: Arc::new(GoogleCalendarClient::new(&calendar).unwrap()),
        generator: Some(Arc::new(GeminiClient::new(&generation).unwrap())),
        linkedin: Arc::new(LinkedInPublisher::new(&social).unwrap()),
        facebook: Arc::new(FacebookPublisher::new(&social).unwrap()),
        cron_secret: None,
        db,
    }
}

async fn setup() -> (MockServer, Database, AppState) {
    let server = MockServer::start().await;
    let db = Database::open_in_memory().unwrap();
    let state = state(&server, db.clone());
    (server, db, state)
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = ApiServer::router(state.clone())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn upcoming_event(id: &str) -> Value {
    json!({
        "id": id,
        "summary": "Quarterly review",
        "start": { "dateTime": (Utc::now() + Duration::hours(2)).to_rfc3339() },
        "end": { "dateTime": (Utc::now() + Duration::hours(3)).to_rfc3339() },
        "hangoutLink": "https://meet.google.com/abc-defg-hij"
    })
}

fn completed_meeting(db: &Database, transcript: &str) -> String {
    db.with_conn(|conn| {
        let meeting = MeetingRepository::upsert_recording(
            conn,
            &RecordingRequest {
                user_id: USER,
                external_event_id: "evt-done",
                title: "Kickoff",
                start_time: Utc::now() - Duration::hours(2),
                meeting_link: "https://zoom.us/j/42",
                platform: Platform::Zoom,
                recall_bot_id: "bot-done",
            },
        )?;
        MeetingRepository::transition(
            conn,
            &meeting.id,
            MeetingStatus::Scheduled,
            MeetingStatus::Processing,
        )?;
        MeetingRepository::begin_transcription(conn, &meeting.id, "rec-done")?;
        MeetingRepository::complete(conn, &meeting.id, transcript)?;
        Ok(meeting.id)
    })
    .unwrap()
}

const TRANSCRIPT: &str =
    r#"[{"participant":{"name":"Alice"},"words":[{"text":"Ship"},{"text":"it"}]}]"#;

#[tokio::test]
async fn test_requests_without_user_are_rejected() {
    let (_server, _db, state) = setup().await;

    let (status, body) = send(&state, "GET", "/api/meetings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_status_endpoint() {
    let (_server, _db, state) = setup().await;

    let (status, body) = send(&state, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "meetscribe");
}

#[tokio::test]
async fn test_toggle_twice_creates_one_bot_and_one_meeting() {
    let (server, db, state) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bot/"))
        .and(header("Authorization", "Token test-key"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "bot-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let toggle = json!({ "event": upcoming_event("evt-1"), "isEnabled": true });
    let (status, first) = send(
        &state,
        "POST",
        "/api/meetings/toggle",
        Some(USER),
        Some(toggle.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["meeting"]["status"], "SCHEDULED");
    assert_eq!(first["meeting"]["platform"], "Google Meet");

    let (status, second) =
        send(&state, "POST", "/api/meetings/toggle", Some(USER), Some(toggle)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["meeting"]["id"], first["meeting"]["id"]);

    let all = db
        .with_conn(|conn| MeetingRepository::list(conn, None, 10))
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].recall_bot_id.as_deref(), Some("bot-1"));
}

#[tokio::test]
async fn test_toggle_without_link_is_bad_request() {
    let (_server, _db, state) = setup().await;

    let mut event = upcoming_event("evt-1");
    event.as_object_mut().unwrap().remove("hangoutLink");
    let (status, body) = send(
        &state,
        "POST",
        "/api/meetings/toggle",
        Some(USER),
        Some(json!({ "event": event, "isEnabled": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No meeting link found for this event.");
}

#[tokio::test]
async fn test_bot_creation_failure_maps_to_bad_gateway() {
    let (server, db, state) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bot/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/meetings/toggle",
        Some(USER),
        Some(json!({ "event": upcoming_event("evt-1"), "isEnabled": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let all = db
        .with_conn(|conn| MeetingRepository::list(conn, None, 10))
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_cancel_unknown_event_is_not_found() {
    let (_server, _db, state) = setup().await;

    let (status, _) = send(
        &state,
        "POST",
        "/api/meetings/cancel",
        Some(USER),
        Some(json!({ "googleEventId": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_polling_drives_meeting_to_completed() {
    let (server, _db, state) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bot/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "bot-1" })))
        .mount(&server)
        .await;
    let (_, toggled) = send(
        &state,
        "POST",
        "/api/meetings/toggle",
        Some(USER),
        Some(json!({ "event": upcoming_event("evt-1"), "isEnabled": true })),
    )
    .await;
    let meeting_id = toggled["meeting"]["id"].as_str().unwrap().to_string();

    // Call over, recording finished, no transcript yet.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/bot/bot-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bot-1",
            "status_changes": [{ "code": "in_call_recording" }, { "code": "call_ended" }],
            "recordings": [{ "id": "rec-1", "status": { "code": "done" }, "media_shortcuts": {} }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/recording/rec-1/create_transcript/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "tr-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, sweep) = send(&state, "GET", "/api/cron/poll", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sweep["polled"], 1);
    assert_eq!(sweep["transitions"][0]["to"], "PROCESSING");

    let (_, sweep) = send(&state, "GET", "/api/cron/poll", None, None).await;
    assert_eq!(sweep["transitions"][0]["to"], "TRANSCRIBING");
    server.verify().await;

    // Transcript ready.
    server.reset().await;
    let download = format!("{}/download/rec-1.json", server.uri());
    Mock::given(method("GET"))
        .and(path("/bot/bot-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bot-1",
            "status_changes": [{ "code": "call_ended" }, { "code": "done" }],
            "recordings": [{
                "id": "rec-1",
                "status": { "code": "done" },
                "media_shortcuts": {
                    "transcript": {
                        "status": { "code": "done" },
                        "data": { "download_url": download }
                    }
                }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/rec-1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRANSCRIPT))
        .mount(&server)
        .await;

    let (_, sweep) = send(&state, "GET", "/api/cron/poll", None, None).await;
    assert_eq!(sweep["transitions"][0]["to"], "COMPLETED");

    let (_, sweep) = send(&state, "GET", "/api/cron/poll", None, None).await;
    assert_eq!(sweep["polled"], 0);

    let (status, detail) = send(
        &state,
        "GET",
        &format!("/api/meetings/{}", meeting_id),
        Some(USER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "COMPLETED");
    assert_eq!(detail["normalizedTranscript"], "Alice: Ship it");

    let (_, list) = send(&state, "GET", "/api/meetings", Some(USER), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Another user cannot see it.
    let (status, _) = send(
        &state,
        "GET",
        &format!("/api/meetings/{}", meeting_id),
        Some("user-2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, logs) = send(&state, "GET", "/api/admin/logs?lines=2", None, None).await;
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Polling sweep executed"));
}

#[tokio::test]
async fn test_cron_secret_is_enforced() {
    let (_server, _db, mut state) = setup().await;
    state.cron_secret = Some("s3cret".to_string());

    let (status, _) = send(&state, "GET", "/api/cron/poll", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/cron/poll")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = ApiServer::router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_generate_and_publish_linkedin_post() {
    let (server, db, state) = setup().await;
    let meeting_id = completed_meeting(&db, TRANSCRIPT);

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "gen-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "We shipped it! #launch" }] } }]
        })))
        .mount(&server)
        .await;

    let (status, automation) = send(
        &state,
        "POST",
        "/api/automations",
        Some(USER),
        Some(json!({
            "name": "Launch post",
            "platform": "LINKEDIN",
            "prompt": "Write an upbeat post",
            "example": ""
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(automation["example"].is_null());

    let (status, post) = send(
        &state,
        "POST",
        "/api/generate/social-post",
        Some(USER),
        Some(json!({ "automationId": automation["id"], "meetingId": meeting_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["status"], "DRAFT");
    assert_eq!(post["platform"], "LINKEDIN");
    assert_eq!(post["content"], "We shipped it! #launch");

    let post_id = post["id"].as_str().unwrap().to_string();
    let publish_uri = format!("/api/posts/{}/publish", post_id);

    let (status, body) = send(&state, "POST", &publish_uri, Some(USER), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "LinkedIn account not connected.");

    db.with_conn(|conn| {
        AccountRepository::upsert(
            conn,
            &LinkedAccount {
                user_id: USER.to_string(),
                provider: accounts::LINKEDIN.to_string(),
                provider_account_id: "li-person".to_string(),
                access_token: Some("li-token".to_string()),
                refresh_token: None,
                expires_at: None,
            },
        )
    })
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/ugcPosts"))
        .and(header("authorization", "Bearer li-token"))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:7"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, published) = send(&state, "POST", &publish_uri, Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["status"], "PUBLISHED");
    assert_eq!(published["remoteId"], "urn:li:share:7");

    let (status, _) = send(&state, "POST", &publish_uri, Some(USER), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, posts) = send(
        &state,
        "GET",
        &format!("/api/meetings/{}/posts", meeting_id),
        Some(USER),
        None,
    )
    .await;
    assert_eq!(posts.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_draft_cleanup_keeps_published_posts() {
    let (server, db, state) = setup().await;
    let meeting_id = completed_meeting(&db, TRANSCRIPT);

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Draft copy" }] } }]
        })))
        .mount(&server)
        .await;

    let (_, automation) = send(
        &state,
        "POST",
        "/api/automations",
        Some(USER),
        Some(json!({ "name": "FB", "platform": "FACEBOOK", "prompt": "Summarize" })),
    )
    .await;
    for _ in 0..2 {
        send(
            &state,
            "POST",
            "/api/generate/social-post",
            Some(USER),
            Some(json!({ "automationId": automation["id"], "meetingId": meeting_id })),
        )
        .await;
    }

    let (status, body) = send(
        &state,
        "DELETE",
        &format!("/api/meetings/{}/posts/draft", meeting_id),
        Some(USER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 2);
}

#[tokio::test]
async fn test_generate_email_from_inline_transcript() {
    let (server, _db, state) = setup().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hi all, thanks for joining." }] } }]
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/generate/email",
        Some(USER),
        Some(json!({ "transcript": "Alice: Ship it" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "Hi all, thanks for joining.");
}

#[tokio::test]
async fn test_generation_unconfigured_is_unavailable() {
    let (_server, _db, mut state) = setup().await;
    state.generator = None;

    let (status, _) = send(
        &state,
        "POST",
        "/api/generate/email",
        Some(USER),
        Some(json!({ "transcript": "Alice: Ship it" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_settings_round_trip() {
    let (_server, _db, state) = setup().await;

    let (_, settings) = send(&state, "GET", "/api/settings", Some(USER), None).await;
    assert_eq!(settings["botJoinOffsetMinutes"], 5);

    let (status, _) = send(
        &state,
        "POST",
        "/api/settings",
        Some(USER),
        Some(json!({ "botJoinOffsetMinutes": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        "POST",
        "/api/settings",
        Some(USER),
        Some(json!({ "botJoinOffsetMinutes": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, settings) = send(&state, "GET", "/api/settings", Some(USER), None).await;
    assert_eq!(settings["botJoinOffsetMinutes"], 10);
}

#[tokio::test]
async fn test_calendar_events_carry_recording_state() {
    let (server, db, state) = setup().await;

    let (status, _) = send(&state, "GET", "/api/calendar/events", Some(USER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    db.with_conn(|conn| {
        AccountRepository::upsert(
            conn,
            &LinkedAccount {
                user_id: USER.to_string(),
                provider: accounts::GOOGLE.to_string(),
                provider_account_id: "g-1".to_string(),
                access_token: Some("g-token".to_string()),
                refresh_token: None,
                expires_at: None,
            },
        )
    })
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer g-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [upcoming_event("evt-1"), {
                "id": "evt-2",
                "start": { "date": "2030-01-01" },
                "location": "https://acme.zoom.us/j/123456"
            }],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "bot-1" })))
        .mount(&server)
        .await;

    send(
        &state,
        "POST",
        "/api/meetings/toggle",
        Some(USER),
        Some(json!({ "event": upcoming_event("evt-1"), "isEnabled": true })),
    )
    .await;

    let (status, body) = send(&state, "GET", "/api/calendar/events", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextPageToken"], "page-2");

    let events = body["events"].as_array().unwrap();
    assert_eq!(events[0]["isRecordingEnabled"], true);
    assert_eq!(events[0]["status"], "SCHEDULED");
    assert_eq!(events[1]["isRecordingEnabled"], false);
    assert_eq!(events[1]["platform"], "Zoom");
    assert_eq!(events[1]["meetingLink"], "https://acme.zoom.us/j/123456");
}

#[tokio::test]
async fn test_connections_list_and_disconnect() {
    let (_server, db, state) = setup().await;

    db.with_conn(|conn| {
        AccountRepository::upsert(
            conn,
            &LinkedAccount {
                user_id: USER.to_string(),
                provider: accounts::FACEBOOK.to_string(),
                provider_account_id: "fb-1".to_string(),
                access_token: Some("fb-token".to_string()),
                refresh_token: None,
                expires_at: None,
            },
        )
    })
    .unwrap();

    let (_, list) = send(&state, "GET", "/api/connections", Some(USER), None).await;
    assert_eq!(list, json!([{ "provider": "facebook" }]));

    let (status, _) = send(
        &state,
        "POST",
        "/api/connections/disconnect",
        Some(USER),
        Some(json!({ "provider": "facebook" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &state,
        "POST",
        "/api/connections/disconnect",
        Some(USER),
        Some(json!({ "provider": "facebook" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
