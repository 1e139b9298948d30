use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::transition::{next_step, Step};
use crate::config::{PollerConfig, RecallConfig};
use crate::db::cron_logs::CronLogRepository;
use crate::db::meetings::{Meeting, MeetingRepository};
use crate::db::Database;
use crate::meeting::MeetingStatus;
use crate::recall::BotLifecycleClient;

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub transcript_language: String,
    /// Only poll meetings whose start time has passed.
    pub require_past_start: bool,
}

impl SweepOptions {
    pub fn from_config(recall: &RecallConfig, poller: &PollerConfig) -> Self {
        Self {
            transcript_language: recall.transcript_language.clone(),
            require_past_start: poller.require_past_start,
        }
    }
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            transcript_language: "en".to_string(),
            require_past_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub meeting_id: String,
    pub from: MeetingStatus,
    pub to: MeetingStatus,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub polled: usize,
    pub transitions: Vec<Transition>,
    /// Meetings skipped because of a provider or storage fault.
    pub errors: usize,
}

impl SweepReport {
    pub fn summary(&self) -> String {
        format!(
            "polled {}, advanced {}, errors {}",
            self.polled,
            self.transitions.len(),
            self.errors
        )
    }
}

/// Runs polling sweeps: fetch each candidate meeting's bot, apply one
/// transition, persist it.
pub struct Reconciler {
    db: Database,
    bots: Arc<dyn BotLifecycleClient>,
    options: SweepOptions,
}

impl Reconciler {
    pub fn new(db: Database, bots: Arc<dyn BotLifecycleClient>, options: SweepOptions) -> Self {
        Self { db, bots, options }
    }

    /// Run one sweep and append its outcome to the cron log.
    ///
    /// A fault on one meeting is logged and counted; only a failure to load
    /// the candidate set fails the sweep.
    pub async fn sweep(&self) -> Result<SweepReport> {
        info!("Polling sweep started");

        let result = self.run().await;

        let message = match &result {
            Ok(report) => {
                info!("Polling sweep finished: {}", report.summary());
                format!("Polling sweep executed: {}", report.summary())
            }
            Err(e) => {
                error!("Polling sweep failed: {:#}", e);
                format!("Polling sweep failed: {:#}", e)
            }
        };

        if let Err(e) = self
            .db
            .call(move |conn| CronLogRepository::insert(conn, &message))
            .await
        {
            warn!("Failed to write cron log: {:#}", e);
        }

        result
    }

    async fn run(&self) -> Result<SweepReport> {
        let cutoff = self.options.require_past_start.then(Utc::now);
        let candidates = self
            .db
            .call(move |conn| MeetingRepository::candidates(conn, cutoff))
            .await
            .context("Failed to load candidate meetings")?;

        let mut report = SweepReport {
            polled: candidates.len(),
            ..SweepReport::default()
        };

        if candidates.is_empty() {
            debug!("No meetings to poll");
            return Ok(report);
        }

        for meeting in &candidates {
            match self.reconcile(meeting).await {
                Ok(Some(transition)) => report.transitions.push(transition),
                Ok(None) => {}
                Err(e) => {
                    report.errors += 1;
                    warn!(
                        meeting_id = %meeting.id,
                        bot_id = meeting.recall_bot_id.as_deref().unwrap_or("-"),
                        "Skipping meeting this sweep: {:#}",
                        e
                    );
                }
            }
        }

        Ok(report)
    }

    /// Reconcile one meeting against its bot. Returns the transition that
    /// was persisted, if any.
    pub async fn reconcile(&self, meeting: &Meeting) -> Result<Option<Transition>> {
        let bot_id = meeting
            .recall_bot_id
            .as_deref()
            .context("Meeting has no bot")?;

        debug!("Polling bot {} for meeting {}", bot_id, meeting.id);

        let bot = self
            .bots
            .get_bot(bot_id)
            .await
            .with_context(|| format!("Failed to fetch status of bot {}", bot_id))?;

        let step = next_step(
            meeting.status,
            meeting.recall_recording_id.as_deref(),
            &bot,
        );
        let id = meeting.id.clone();

        match step {
            Step::Hold { reason } => {
                debug!("Meeting {} unchanged: {}", meeting.id, reason);
                Ok(None)
            }

            Step::Stalled { reason } => {
                warn!("Meeting {} stalled in {}: {}", meeting.id, meeting.status, reason);
                Ok(None)
            }

            Step::MarkProcessing => {
                self.commit(meeting, MeetingStatus::Processing, move |conn| {
                    MeetingRepository::transition(
                        conn,
                        &id,
                        MeetingStatus::Scheduled,
                        MeetingStatus::Processing,
                    )
                })
                .await
            }

            Step::MarkFailed { reason } => {
                warn!("Meeting {} failed: {}", meeting.id, reason);
                let from = meeting.status;
                self.commit(meeting, MeetingStatus::Failed, move |conn| {
                    MeetingRepository::transition(conn, &id, from, MeetingStatus::Failed)
                })
                .await
            }

            Step::RequestTranscript { recording_id } => {
                self.bots
                    .create_transcript_job(&recording_id, &self.options.transcript_language)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to start transcript job for recording {}",
                            recording_id
                        )
                    })?;

                self.commit(meeting, MeetingStatus::Transcribing, move |conn| {
                    MeetingRepository::begin_transcription(conn, &id, &recording_id)
                })
                .await
            }

            Step::AdoptTranscript { recording_id } => {
                info!(
                    "Recording {} already has a transcript job, adopting it",
                    recording_id
                );
                self.commit(meeting, MeetingStatus::Transcribing, move |conn| {
                    MeetingRepository::begin_transcription(conn, &id, &recording_id)
                })
                .await
            }

            Step::Complete {
                recording_id,
                download_url,
            } => {
                let payload = self
                    .bots
                    .download_transcript(&download_url)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to download transcript of recording {}",
                            recording_id
                        )
                    })?;

                self.commit(meeting, MeetingStatus::Completed, move |conn| {
                    MeetingRepository::complete(conn, &id, &payload)
                })
                .await
            }
        }
    }

    /// Persist a compare-and-set write. A `false` from `write` means another
    /// sweep got there first.
    async fn commit<F>(
        &self,
        meeting: &Meeting,
        to: MeetingStatus,
        write: F,
    ) -> Result<Option<Transition>>
    where
        F: FnOnce(&Connection) -> Result<bool> + Send + 'static,
    {
        if !self.db.call(write).await? {
            info!(
                "Meeting {} left {} concurrently, not moving it to {}",
                meeting.id, meeting.status, to
            );
            return Ok(None);
        }

        info!("Meeting {}: {} -> {}", meeting.id, meeting.status, to);
        Ok(Some(Transition {
            meeting_id: meeting.id.clone(),
            from: meeting.status,
            to,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::meetings::RecordingRequest;
    use crate::meeting::Platform;
    use crate::recall::{BotSnapshot, ProviderError};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBots {
        snapshots: Mutex<HashMap<String, serde_json::Value>>,
        downloads: Mutex<HashMap<String, String>>,
        reject_transcript_jobs: Mutex<bool>,
        transcript_jobs: Mutex<Vec<String>>,
    }

    impl FakeBots {
        fn set(&self, bot_id: &str, snapshot: serde_json::Value) {
            self.snapshots
                .lock()
                .unwrap()
                .insert(bot_id.to_string(), snapshot);
        }

        fn jobs(&self) -> Vec<String> {
            self.transcript_jobs.lock().unwrap().clone()
        }
    }

    fn unavailable(endpoint: &str) -> ProviderError {
        ProviderError::Status {
            endpoint: endpoint.to_string(),
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[async_trait]
    impl BotLifecycleClient for FakeBots {
        async fn create_bot(&self, _: &str, _: DateTime<Utc>) -> Result<String, ProviderError> {
            Ok("bot-new".to_string())
        }

        async fn delete_bot(&self, _: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn get_bot(&self, bot_id: &str) -> Result<BotSnapshot, ProviderError> {
            let value = self
                .snapshots
                .lock()
                .unwrap()
                .get(bot_id)
                .cloned()
                .ok_or_else(|| unavailable(bot_id))?;
            Ok(serde_json::from_value(value).unwrap())
        }

        async fn create_transcript_job(
        &self,
        recording_id: &str,
        _: &str,
    ) -> Result<(), ProviderError> {
            if *self.reject_transcript_jobs.lock().unwrap() {
                return Err(unavailable(recording_id));
            }
            self.transcript_jobs
                .lock()
                .unwrap()
                .push(recording_id.to_string());
            Ok(())
        }

        async fn download_transcript(&self, url: &str) -> Result<String, ProviderError> {
            self.downloads
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| unavailable(url))
        }
    }

    fn setup() -> (Database, Arc<FakeBots>, Reconciler) {
        let db = Database::open_in_memory().unwrap();
        let bots = Arc::new(FakeBots::default());
        let reconciler = Reconciler::new(db.clone(), bots.clone(), SweepOptions::default());
        (db, bots, reconciler)
    }

    fn add_meeting(db: &Database, event: &str, bot: &str) -> Meeting {
        add_meeting_at(db, event, bot, Utc::now() - Duration::hours(1))
    }

    fn add_meeting_at(db: &Database, event: &str, bot: &str, start: DateTime<Utc>) -> Meeting {
        db.with_conn(|conn| {
            MeetingRepository::upsert_recording(
                conn,
                &RecordingRequest {
                    user_id: "user-1",
                    external_event_id: event,
                    title: "Sync",
                    start_time: start,
                    meeting_link: "https://zoom.us/j/1",
                    platform: Platform::Zoom,
                    recall_bot_id: bot,
                },
            )
        })
        .unwrap()
    }

    fn status_of(db: &Database, id: &str) -> Meeting {
        db.with_conn(|conn| MeetingRepository::get(conn, id))
            .unwrap()
            .unwrap()
    }

    fn ended_with_recording(transcript: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "bot-1",
            "status_changes": [{ "code": "call_ended" }],
            "recordings": [{
                "id": "rec-1",
                "status": { "code": "done" },
                "media_shortcuts": { "transcript": transcript }
            }]
        })
    }

    #[tokio::test]
    async fn test_full_lifecycle_one_step_per_sweep() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");

        bots.set(
            "bot-1",
            json!({ "id": "bot-1", "status_changes": [{ "code": "in_call_recording" }] }),
        );
        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.polled, 1);
        assert!(report.transitions.is_empty());

        bots.set("bot-1", ended_with_recording(json!(null)));
        reconciler.sweep().await.unwrap();
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Processing);
        assert!(bots.jobs().is_empty());

        reconciler.sweep().await.unwrap();
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Transcribing);
        assert_eq!(bots.jobs(), vec!["rec-1".to_string()]);

        bots.set(
            "bot-1",
            ended_with_recording(json!({
                "status": { "code": "done" },
                "data": { "download_url": "https://files/rec-1.json" }
            })),
        );
        bots.downloads.lock().unwrap().insert(
            "https://files/rec-1.json".to_string(),
            r#"[{"participant":{"name":"Alice"},"words":[{"text":"Hi"},{"text":"there"}]}]"#
                .to_string(),
        );
        let report = reconciler.sweep().await.unwrap();
        assert_eq!(
            report.transitions,
            vec![Transition {
                meeting_id: meeting.id.clone(),
                from: MeetingStatus::Transcribing,
                to: MeetingStatus::Completed,
            }]
        );

        let done = status_of(&db, &meeting.id);
        assert_eq!(done.status, MeetingStatus::Completed);
        assert_eq!(
            crate::normalizer::normalize(done.transcript.as_deref()),
            "Alice: Hi there"
        );

        // Terminal: no longer a candidate.
        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.polled, 0);
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_is_idempotent() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");
        bots.set(
            "bot-1",
            ended_with_recording(json!({ "status": { "code": "processing" } })),
        );

        reconciler.sweep().await.unwrap();
        reconciler.sweep().await.unwrap();
        let before = status_of(&db, &meeting.id);
        assert_eq!(before.status, MeetingStatus::Transcribing);

        for _ in 0..3 {
            let report = reconciler.sweep().await.unwrap();
            assert!(report.transitions.is_empty());
        }
        let after = status_of(&db, &meeting.id);
        assert_eq!(after.status, before.status);
        assert_eq!(after.transcript, before.transcript);
        // The existing artifact was adopted, no job was started.
        assert!(bots.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_call_ended_without_recordings_fails() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");
        bots.set("bot-1", json!({ "id": "bot-1", "status_changes": [{ "code": "call_ended" }] }));

        reconciler.sweep().await.unwrap();
        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.transitions[0].to, MeetingStatus::Failed);

        let failed = status_of(&db, &meeting.id);
        assert_eq!(failed.status, MeetingStatus::Failed);
        assert!(failed.transcript.is_none());
    }

    #[tokio::test]
    async fn test_fatal_bot_fails_scheduled_meeting() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");
        bots.set(
            "bot-1",
            json!({
                "id": "bot-1",
                "status_changes": [{ "code": "fatal", "sub_code": "bot_errored" }]
            }),
        );

        reconciler.sweep().await.unwrap();
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Failed);
    }

    #[tokio::test]
    async fn test_one_faulty_meeting_does_not_stop_sweep() {
        let (db, bots, reconciler) = setup();
        let broken = add_meeting(&db, "evt-1", "bot-missing");
        let healthy = add_meeting(&db, "evt-2", "bot-2");
        bots.set("bot-2", json!({ "id": "bot-2", "status_changes": [{ "code": "call_ended" }] }));

        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.polled, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(
            report.transitions,
            vec![Transition {
                meeting_id: healthy.id.clone(),
                from: MeetingStatus::Scheduled,
                to: MeetingStatus::Processing,
            }]
        );
        assert_eq!(status_of(&db, &broken.id).status, MeetingStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_rejected_transcript_job_keeps_processing() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");
        bots.set("bot-1", ended_with_recording(json!(null)));
        reconciler.sweep().await.unwrap();

        *bots.reject_transcript_jobs.lock().unwrap() = true;
        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Processing);

        *bots.reject_transcript_jobs.lock().unwrap() = false;
        reconciler.sweep().await.unwrap();
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Transcribing);
    }

    #[tokio::test]
    async fn test_failed_download_retries_next_sweep() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");
        bots.set(
            "bot-1",
            ended_with_recording(json!({
                "status": { "code": "done" },
                "data": { "download_url": "https://files/late.json" }
            })),
        );
        reconciler.sweep().await.unwrap();
        reconciler.sweep().await.unwrap();

        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.errors, 1);
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Transcribing);

        bots.downloads
            .lock()
            .unwrap()
            .insert("https://files/late.json".to_string(), "[]".to_string());
        reconciler.sweep().await.unwrap();
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Completed);
    }

    #[tokio::test]
    async fn test_stale_view_does_not_regress() {
        let (db, bots, reconciler) = setup();
        let meeting = add_meeting(&db, "evt-1", "bot-1");
        bots.set("bot-1", json!({ "id": "bot-1", "status_changes": [{ "code": "fatal" }] }));

        // Another sweep moved the meeting on after this one loaded it.
        db.with_conn(|conn| {
            MeetingRepository::transition(
                conn,
                &meeting.id,
                MeetingStatus::Scheduled,
                MeetingStatus::Processing,
            )
        })
        .unwrap();

        let outcome = reconciler.reconcile(&meeting).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(status_of(&db, &meeting.id).status, MeetingStatus::Processing);
    }

    #[tokio::test]
    async fn test_time_gate_skips_future_meetings() {
        let db = Database::open_in_memory().unwrap();
        let bots = Arc::new(FakeBots::default());
        let reconciler = Reconciler::new(
            db.clone(),
            bots.clone(),
            SweepOptions {
                require_past_start: true,
                ..SweepOptions::default()
            },
        );
        add_meeting_at(&db, "evt-future", "bot-1", Utc::now() + Duration::days(1));
        add_meeting(&db, "evt-past", "bot-2");
        bots.set("bot-2", json!({ "id": "bot-2" }));

        let report = reconciler.sweep().await.unwrap();
        assert_eq!(report.polled, 1);
    }

    #[tokio::test]
    async fn test_sweep_writes_cron_log() {
        let (db, _bots, reconciler) = setup();
        reconciler.sweep().await.unwrap();

        let logs = db
            .with_conn(|conn| CronLogRepository::list(conn, 10))
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(
            logs[0].message,
            "Polling sweep executed: polled 0, advanced 0, errors 0"
        );
    }

    #[tokio::test]
    async fn test_storage_failure_fails_sweep() {
        let (db, _bots, reconciler) = setup();
        db.with_conn(|conn| {
            Ok(conn.execute_batch("DROP TABLE social_posts; DROP TABLE meetings;")?)
        })
            .unwrap();

        assert!(reconciler.sweep().await.is_err());

        let logs = db
            .with_conn(|conn| CronLogRepository::list(conn, 10))
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].message.starts_with("Polling sweep failed"));
    }
}
