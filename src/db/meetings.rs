//! Meeting record persistence.
//!
//! Raw SQL with rusqlite, no ORM. Status writes are compare-and-set on the
//! current status, so two sweeps racing on the same meeting can never move it
//! backwards: the loser's `UPDATE` simply matches zero rows.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use super::{conversion_error, parse_timestamp, timestamp};
use crate::meeting::{MeetingStatus, Platform};

const COLUMNS: &str = "id, user_id, external_event_id, title, start_time, meeting_link, platform, \
     recording_enabled, recall_bot_id, recall_recording_id, transcript, status, \
     created_at, updated_at";

/// A meeting record from the database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub user_id: String,
    pub external_event_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub meeting_link: Option<String>,
    pub platform: Platform,
    pub recording_enabled: bool,
    pub recall_bot_id: Option<String>,
    #[serde(skip)]
    pub recall_recording_id: Option<String>,
    pub transcript: Option<String>,
    pub status: MeetingStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields written when a user opts a calendar occurrence into recording.
#[derive(Debug, Clone)]
pub struct RecordingRequest<'a> {
    pub user_id: &'a str,
    pub external_event_id: &'a str,
    pub title: &'a str,
    pub start_time: DateTime<Utc>,
    pub meeting_link: &'a str,
    pub platform: Platform,
    pub recall_bot_id: &'a str,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let start_time: String = row.get(4)?;
    let platform: String = row.get(6)?;
    let status: String = row.get(11)?;

    Ok(Meeting {
        id: row.get(0)?,
        user_id: row.get(1)?,
        external_event_id: row.get(2)?,
        title: row.get(3)?,
        start_time: parse_timestamp(&start_time).map_err(|e| conversion_error(4, e))?,
        meeting_link: row.get(5)?,
        platform: Platform::parse(&platform),
        recording_enabled: row.get(7)?,
        recall_bot_id: row.get(8)?,
        recall_recording_id: row.get(9)?,
        transcript: row.get(10)?,
        status: MeetingStatus::parse(&status).map_err(|e| conversion_error(11, e))?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Repository for meeting records.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert or update the meeting for `(user_id, external_event_id)` with
    /// recording enabled. Status is only initialised on insert; an existing
    /// meeting keeps whatever status it has reached.
    ///
    /// A meeting that is still enabled with a bot keeps that bot; callers
    /// compare the returned `recall_bot_id` with their own. The tracked
    /// recording is cleared whenever the bot changes.
    pub fn upsert_recording(conn: &Connection, req: &RecordingRequest<'_>) -> Result<Meeting> {
        let now = timestamp(Utc::now());
        conn.execute(
            "INSERT INTO meetings (id, user_id, external_event_id, title, start_time, \
             meeting_link, platform, recording_enabled, recall_bot_id, status, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9, ?10, ?10) \
             ON CONFLICT(user_id, external_event_id) DO UPDATE SET \
             title = excluded.title, start_time = excluded.start_time, \
             meeting_link = excluded.meeting_link, platform = excluded.platform, \
             recall_recording_id = CASE \
                 WHEN meetings.recording_enabled = 1 AND meetings.recall_bot_id IS NOT NULL \
                     THEN meetings.recall_recording_id \
                 WHEN meetings.recall_bot_id IS excluded.recall_bot_id \
                     THEN meetings.recall_recording_id \
                 ELSE NULL END, \
             recall_bot_id = CASE \
                 WHEN meetings.recording_enabled = 1 AND meetings.recall_bot_id IS NOT NULL \
                     THEN meetings.recall_bot_id \
                 ELSE excluded.recall_bot_id END, \
             recording_enabled = 1, updated_at = excluded.updated_at",
            params![
                Uuid::new_v4().to_string(),
                req.user_id,
                req.external_event_id,
                req.title,
                timestamp(req.start_time),
                req.meeting_link,
                req.platform.as_str(),
                req.recall_bot_id,
                MeetingStatus::Scheduled.as_str(),
                now,
            ],
        )
        .context("Failed to upsert meeting")?;

        Self::find_by_event(conn, req.user_id, req.external_event_id)?
            .context("Meeting missing after upsert")
    }

    pub fn find_by_event(
        conn: &Connection,
        user_id: &str,
        external_event_id: &str,
    ) -> Result<Option<Meeting>> {
        conn.query_row(
            &format!(
                "SELECT {COLUMNS} FROM meetings WHERE user_id = ?1 AND external_event_id = ?2"
            ),
            params![user_id, external_event_id],
            map_row,
        )
        .optional()
        .context("Failed to query meeting by event")
    }

    /// Get a meeting by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Meeting>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM meetings WHERE id = ?1"),
            params![id],
            map_row,
        )
        .optional()
        .context("Failed to query meeting")
    }

    /// Get a meeting by ID, only if it belongs to `user_id`.
    pub fn get_for_user(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Meeting>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM meetings WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            map_row,
        )
        .optional()
        .context("Failed to query meeting")
    }

    /// Meetings the user has for any of `event_ids`.
    pub fn find_by_events(
        conn: &Connection,
        user_id: &str,
        event_ids: &[String],
    ) -> Result<Vec<Meeting>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (0..event_ids.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {COLUMNS} FROM meetings \
             WHERE user_id = ?1 AND external_event_id IN ({placeholders})"
        );

        let mut stmt = conn
            .prepare(&sql)
            .context("Failed to prepare meetings by events query")?;
        let values = std::iter::once(user_id).chain(event_ids.iter().map(String::as_str));
        let rows = stmt
            .query_map(params_from_iter(values), map_row)
            .context("Failed to query meetings by events")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }
        Ok(meetings)
    }

    /// Completed meetings for a user, most recent start first.
    pub fn list_completed(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<Meeting>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM meetings WHERE user_id = ?1 AND status = ?2 \
                 ORDER BY start_time DESC LIMIT ?3"
            ))
            .context("Failed to prepare completed meetings query")?;

        let rows = stmt
            .query_map(
                params![user_id, MeetingStatus::Completed.as_str(), limit as i64],
                map_row,
            )
            .context("Failed to list completed meetings")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }
        Ok(meetings)
    }

    /// List meetings across all users, newest start first.
    pub fn list(
        conn: &Connection,
        status: Option<MeetingStatus>,
        limit: usize,
    ) -> Result<Vec<Meeting>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM meetings WHERE (?1 IS NULL OR status = ?1) \
                 ORDER BY start_time DESC LIMIT ?2"
            ))
            .context("Failed to prepare meetings list query")?;

        let rows = stmt
            .query_map(params![status.map(|s| s.as_str()), limit as i64], map_row)
            .context("Failed to list meetings")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }
        Ok(meetings)
    }

    /// Meetings the polling sweep should look at: recording enabled, a bot
    /// requested, status not terminal. With `started_before`, only meetings
    /// whose start time is at or before it.
    pub fn candidates(
        conn: &Connection,
        started_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Meeting>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM meetings \
                 WHERE recording_enabled = 1 AND recall_bot_id IS NOT NULL \
                 AND status IN (?1, ?2, ?3) \
                 AND (?4 IS NULL OR start_time <= ?4) \
                 ORDER BY start_time ASC"
            ))
            .context("Failed to prepare candidate meetings query")?;

        let [a, b, c] = MeetingStatus::ACTIVE;
        let rows = stmt
            .query_map(
                params![
                    a.as_str(),
                    b.as_str(),
                    c.as_str(),
                    started_before.map(timestamp)
                ],
                map_row,
            )
            .context("Failed to query candidate meetings")?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }
        Ok(meetings)
    }

    /// Clear the recording flag and bot id. Status and transcript are kept.
    /// Returns false when the user has no meeting for the event.
    pub fn disable_recording(
        conn: &Connection,
        user_id: &str,
        external_event_id: &str,
    ) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE meetings SET recording_enabled = 0, recall_bot_id = NULL, updated_at = ?3 \
                 WHERE user_id = ?1 AND external_event_id = ?2",
                params![user_id, external_event_id, timestamp(Utc::now())],
            )
            .context("Failed to disable meeting recording")?;
        Ok(changed > 0)
    }

    /// Move `id` from `from` to `to` if it is still in `from`.
    ///
    /// Only for edges that carry no data. TRANSCRIBING and COMPLETED are
    /// entered through [`Self::begin_transcription`] and [`Self::complete`].
    pub fn transition(
        conn: &Connection,
        id: &str,
        from: MeetingStatus,
        to: MeetingStatus,
    ) -> Result<bool> {
        if !from.can_advance_to(to) {
            bail!("Illegal meeting transition {} -> {}", from, to);
        }
        if matches!(to, MeetingStatus::Transcribing | MeetingStatus::Completed) {
            bail!("Transition to {} must carry its data", to);
        }

        let changed = conn
            .execute(
                "UPDATE meetings SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
                params![id, from.as_str(), to.as_str(), timestamp(Utc::now())],
            )
            .context("Failed to update meeting status")?;
        Ok(changed > 0)
    }

    /// PROCESSING → TRANSCRIBING, remembering which recording is being
    /// transcribed.
    pub fn begin_transcription(conn: &Connection, id: &str, recording_id: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE meetings SET status = ?3, recall_recording_id = ?4, updated_at = ?5 \
                 WHERE id = ?1 AND status = ?2",
                params![
                    id,
                    MeetingStatus::Processing.as_str(),
                    MeetingStatus::Transcribing.as_str(),
                    recording_id,
                    timestamp(Utc::now()),
                ],
            )
            .context("Failed to begin meeting transcription")?;
        Ok(changed > 0)
    }

    /// TRANSCRIBING → COMPLETED with the downloaded transcript.
    pub fn complete(conn: &Connection, id: &str, transcript: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE meetings SET status = ?3, transcript = ?4, updated_at = ?5 \
                 WHERE id = ?1 AND status = ?2",
                params![
                    id,
                    MeetingStatus::Transcribing.as_str(),
                    MeetingStatus::Completed.as_str(),
                    transcript,
                    timestamp(Utc::now()),
                ],
            )
            .context("Failed to complete meeting")?;
        Ok(changed > 0)
    }
}
