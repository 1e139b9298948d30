use crate::api::{ApiServer, AppState};
use crate::calendar::GoogleCalendarClient;
use crate::config::Config;
use crate::db::Database;
use crate::generation::{GeminiClient, TextGenerator};
use crate::recall::{BotLifecycleClient, RecallClient};
use crate::reconcile::{Reconciler, SweepOptions};
use crate::scheduler::RecordingScheduler;
use crate::social::{FacebookPublisher, LinkedInPublisher};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Open the database and build the sweep engine from `config`.
pub fn build_reconciler(
    config: &Config,
) -> Result<(Database, Arc<Reconciler>, Arc<dyn BotLifecycleClient>)> {
    let db = Database::open(&config.database_path()?)?;
    let bots: Arc<dyn BotLifecycleClient> = Arc::new(RecallClient::from_config(&config.recall)?);
    let reconciler = Arc::new(Reconciler::new(
        db.clone(),
        bots.clone(),
        SweepOptions::from_config(&config.recall, &config.poller),
    ));
    Ok((db, reconciler, bots))
}

pub fn build_state(config: &Config) -> Result<AppState> {
    let (db, reconciler, bots) = build_reconciler(config)?;

    let scheduler = Arc::new(RecordingScheduler::new(
        db.clone(),
        bots,
        config.scheduler.default_join_offset_minutes,
    ));

    let generator: Option<Arc<dyn TextGenerator>> = match config.generation.api_key {
        Some(_) => Some(Arc::new(GeminiClient::new(&config.generation)?)),
        None => {
            warn!("No generation API key configured; follow-up generation is disabled");
            None
        }
    };

    Ok(AppState {
        db,
        reconciler,
        scheduler,
        calendar: Arc::new(GoogleCalendarClient::new(&config.calendar)?),
        generator,
        linkedin: Arc::new(LinkedInPublisher::new(&config.social)?),
        facebook: Arc::new(FacebookPublisher::new(&config.social)?),
        cron_secret: config.poller.cron_secret.clone(),
    })
}

pub async fn run_service(config_path: Option<&Path>) -> Result<()> {
    info!("Starting Meetscribe service");

    let config = Config::load(config_path)?;
    let state = build_state(&config)?;

    match config.poller.interval() {
        Some(interval) => {
            spawn_poller(state.reconciler.clone(), interval);
        }
        None => info!("In-process polling disabled; sweeps run via GET /api/cron/poll"),
    }

    if state.cron_secret.is_none() {
        warn!("No cron secret configured; the polling trigger is open to anyone who can reach it");
    }

    let api_server = ApiServer::new(state, &config.server);

    info!("Meetscribe is ready!");
    api_server.start().await
}

/// Run a sweep every `interval` until the process exits.
pub fn spawn_poller(reconciler: Arc<Reconciler>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting background polling (interval={}s)", interval.as_secs());
        loop {
            match reconciler.sweep().await {
                Ok(report) => debug!("Background sweep: {}", report.summary()),
                // Already recorded in the cron log.
                Err(err) => warn!("Background sweep failed: {err:#}"),
            }
            tokio::time::sleep(interval).await;
        }
    })
}
