use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn open(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;

    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .context("Failed to configure database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meetings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            external_event_id TEXT NOT NULL,
            title TEXT NOT NULL,
            start_time TEXT NOT NULL,
            meeting_link TEXT,
            platform TEXT NOT NULL DEFAULT 'Unknown',
            recording_enabled INTEGER NOT NULL DEFAULT 0,
            recall_bot_id TEXT,
            recall_recording_id TEXT,
            transcript TEXT,
            status TEXT NOT NULL DEFAULT 'SCHEDULED',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, external_event_id)
        )",
        [],
    )
    .context("Failed to create meetings table")?;

    // Candidate selection for the polling sweep
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_status ON meetings(status, recording_enabled)",
        [],
    )
    .context("Failed to create meetings status index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_user_start ON meetings(user_id, start_time DESC)",
        [],
    )
    .context("Failed to create meetings start_time index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cron_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            message TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create cron_logs table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_cron_logs_created_at ON cron_logs(created_at DESC)",
        [],
    )
    .context("Failed to create cron_logs created_at index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            bot_join_offset_minutes INTEGER,
            default_facebook_page_id TEXT,
            facebook_page_access_token TEXT,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            user_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            provider_account_id TEXT NOT NULL,
            access_token TEXT,
            refresh_token TEXT,
            expires_at TEXT,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, provider)
        )",
        [],
    )
    .context("Failed to create accounts table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS automations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            platform TEXT NOT NULL,
            prompt TEXT NOT NULL,
            example TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create automations table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS social_posts (
            id TEXT PRIMARY KEY,
            meeting_id TEXT NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
            platform TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'DRAFT',
            remote_id TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            published_at TIMESTAMP
        )",
        [],
    )
    .context("Failed to create social_posts table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_social_posts_meeting ON social_posts(meeting_id)",
        [],
    )
    .context("Failed to create social_posts meeting index")?;

    Ok(())
}
