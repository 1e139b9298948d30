//! REST API server for Meetscribe.
//!
//! Provides HTTP endpoints for:
//! - The polling trigger (cron)
//! - Meetings, recording toggles and their social posts
//! - Follow-up email and social post generation
//! - User settings, automations and linked accounts
//! - Upcoming calendar events
//! - The sweep audit log

pub mod auth;
pub mod error;
pub mod routes;

use crate::calendar::CalendarProvider;
use crate::config::ServerConfig;
use crate::db::Database;
use crate::generation::TextGenerator;
use crate::reconcile::Reconciler;
use crate::scheduler::RecordingScheduler;
use crate::social::SocialPublisher;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Everything a handler may need. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reconciler: Arc<Reconciler>,
    pub scheduler: Arc<RecordingScheduler>,
    pub calendar: Arc<dyn CalendarProvider>,
    /// `None` when no generation API key is configured.
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub linkedin: Arc<dyn SocialPublisher>,
    pub facebook: Arc<dyn SocialPublisher>,
    /// Bearer secret the cron trigger must present, if set.
    pub cron_secret: Option<String>,
}

pub struct ApiServer {
    host: String,
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            state,
        }
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .nest("/api/cron", routes::cron::router())
            .nest("/api/meetings", routes::meetings::router())
            .nest("/api/posts", routes::posts::router())
            .nest("/api/generate", routes::generate::router())
            .nest("/api/settings", routes::settings::router())
            .nest("/api/automations", routes::automations::router())
            .nest("/api/calendar", routes::calendar::router())
            .nest("/api/connections", routes::connections::router())
            .nest("/api/admin/logs", routes::logs::router())
            .with_state(state)
    }

    pub async fn start(self) -> Result<()> {
        let app = Self::router(self.state);
        let addr = format!("{}:{}", self.host, self.port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        info!("API server listening on http://{}", addr);
        info!("Endpoints:");
        info!("  GET  /api/cron/poll                 - Run one polling sweep");
        info!("  GET  /api/meetings                  - List completed meetings");
        info!("  GET  /api/meetings/:id              - Get a meeting with its transcript");
        info!("  POST /api/meetings/toggle           - Enable or disable recording");
        info!("  POST /api/meetings/cancel           - Cancel a recording");
        info!("  GET  /api/meetings/:id/posts        - List a meeting's social posts");
        info!("  DELETE /api/meetings/:id/posts/draft - Delete a meeting's drafts");
        info!("  PUT  /api/posts/:id                 - Edit a post");
        info!("  DELETE /api/posts/:id               - Delete a post");
        info!("  POST /api/posts/:id/publish         - Publish a post");
        info!("  POST /api/generate/email            - Draft a follow-up email");
        info!("  POST /api/generate/social-post      - Draft a social post");
        info!("  GET  /api/settings                  - Get settings");
        info!("  POST /api/settings                  - Update bot join offset");
        info!("  POST /api/settings/facebook-page    - Select the Facebook page");
        info!("  GET  /api/automations               - List automations");
        info!("  GET  /api/calendar/events           - Upcoming calendar events");
        info!("  GET  /api/connections               - Linked accounts");
        info!("  GET  /api/admin/logs                - Sweep audit log");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "meetscribe",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "meetscribe"
    }))
}
