//! Append-only sweep audit log.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;

use super::timestamp;

pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronLog {
    pub id: i64,
    pub message: String,
    pub created_at: String,
}

pub struct CronLogRepository;

impl CronLogRepository {
    pub fn insert(conn: &Connection, message: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO cron_logs (message, created_at) VALUES (?1, ?2)",
            params![message, timestamp(Utc::now())],
        )
        .context("Failed to insert cron log")?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent entries first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<CronLog>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, message, created_at FROM cron_logs \
                 ORDER BY created_at DESC, id DESC LIMIT ?1",
            )
            .context("Failed to prepare cron log query")?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(CronLog {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .context("Failed to list cron logs")?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }

        Ok(logs)
    }
}
