//! Recording scheduler: turns a user's "record this meeting" into a bot and
//! a meeting record, and undoes it on cancel.

use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::calendar::CalendarEvent;
use crate::db::meetings::{Meeting, MeetingRepository, RecordingRequest};
use crate::db::users::UserRepository;
use crate::db::Database;
use crate::meeting::Platform;
use crate::recall::{BotLifecycleClient, ProviderError};

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("calendar event {0} has no usable start time")]
    MissingStartTime(String),

    #[error("recording bot could not be created: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct RecordingScheduler {
    db: Database,
    bots: Arc<dyn BotLifecycleClient>,
    default_offset_minutes: i64,
}

impl RecordingScheduler {
    pub fn new(
        db: Database,
        bots: Arc<dyn BotLifecycleClient>,
        default_offset_minutes: i64,
    ) -> Self {
        Self {
            db,
            bots,
            default_offset_minutes,
        }
    }

    /// Join offset used for users who never set one.
    pub fn default_offset_minutes(&self) -> i64 {
        self.default_offset_minutes
    }

    /// Send a bot to the event and record the meeting.
    ///
    /// A failed bot creation persists nothing. A meeting that already has a
    /// bot is returned as is; when another enable stores its bot while ours
    /// is being created, ours is deleted and the stored meeting returned.
    pub async fn enable_recording(
        &self,
        user_id: &str,
        event: &CalendarEvent,
        meeting_link: &str,
        platform: Platform,
    ) -> Result<Meeting, SchedulingError> {
        let start_time = event
            .start_time()
            .ok_or_else(|| SchedulingError::MissingStartTime(event.id.clone()))?;

        let (uid, eid) = (user_id.to_string(), event.id.clone());
        let (existing, settings) = self
            .db
            .call(move |conn| {
                Ok((
                    MeetingRepository::find_by_event(conn, &uid, &eid)?,
                    UserRepository::get(conn, &uid)?,
                ))
            })
            .await?;

        if let Some(meeting) = existing {
            if meeting.recording_enabled && meeting.recall_bot_id.is_some() {
                info!(
                    "Recording already enabled for event {} (meeting {})",
                    event.id, meeting.id
                );
                return Ok(meeting);
            }
        }

        let offset = settings
            .bot_join_offset_minutes
            .unwrap_or(self.default_offset_minutes)
            .max(0);
        let join_at = start_time - Duration::minutes(offset);

        let bot_id = self.bots.create_bot(meeting_link, join_at).await?;

        let (uid, eid, title, link) = (
            user_id.to_string(),
            event.id.clone(),
            event.title().to_string(),
            meeting_link.to_string(),
        );
        let stored_bot = bot_id.clone();
        let saved = self
            .db
            .call(move |conn| {
                MeetingRepository::upsert_recording(
                    conn,
                    &RecordingRequest {
                        user_id: &uid,
                        external_event_id: &eid,
                        title: &title,
                        start_time,
                        meeting_link: &link,
                        platform,
                        recall_bot_id: &stored_bot,
                    },
                )
            })
            .await;

        match saved {
            // A concurrent enable stored its bot first; ours is surplus.
            Ok(meeting) if meeting.recall_bot_id.as_deref() != Some(bot_id.as_str()) => {
                warn!(
                    "Event {} already has bot {:?}; deleting duplicate bot {}",
                    event.id, meeting.recall_bot_id, bot_id
                );
                if let Err(e) = self.bots.delete_bot(&bot_id).await {
                    warn!("Failed to delete duplicate bot {}: {}", bot_id, e);
                }
                Ok(meeting)
            }
            Ok(meeting) => {
                info!(
                    "Scheduled bot {} for event {} joining at {}",
                    bot_id, event.id, join_at
                );
                Ok(meeting)
            }
            Err(e) => {
                // The remote bot exists but nothing points at it.
                error!(
                    "Bot {} created for event {} but the meeting could not be saved: {:#}",
                    bot_id, event.id, e
                );
                Err(SchedulingError::Storage(e))
            }
        }
    }

    /// Stop recording an event. Remote bot deletion is best effort.
    /// Returns `None` when the user has no meeting for the event.
    pub async fn cancel_recording(
        &self,
        user_id: &str,
        external_event_id: &str,
    ) -> anyhow::Result<Option<Meeting>> {
        let (uid, eid) = (user_id.to_string(), external_event_id.to_string());
        let Some(meeting) = self
            .db
            .call(move |conn| MeetingRepository::find_by_event(conn, &uid, &eid))
            .await?
        else {
            return Ok(None);
        };

        if let Some(bot_id) = meeting.recall_bot_id.as_deref() {
            if let Err(e) = self.bots.delete_bot(bot_id).await {
                warn!("Failed to delete bot {}: {}", bot_id, e);
            }
        }

        let (uid, eid) = (user_id.to_string(), external_event_id.to_string());
        let meeting_id = meeting.id.clone();
        self.db
            .call(move |conn| {
                MeetingRepository::disable_recording(conn, &uid, &eid)?;
                MeetingRepository::get(conn, &meeting_id)
            })
            .await
            .context("Failed to cancel recording")
            .map(|updated| {
                info!("Recording cancelled for event {}", external_event_id);
                updated
            })
    }
}
