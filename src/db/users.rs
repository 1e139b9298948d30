//! Per-user settings.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::timestamp;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Minutes before start the bot should join. `None` means the
    /// configured default.
    pub bot_join_offset_minutes: Option<i64>,
    pub default_facebook_page_id: Option<String>,
    #[serde(skip)]
    pub facebook_page_access_token: Option<String>,
}

pub struct UserRepository;

impl UserRepository {
    /// Settings for `user_id`; defaults when the user has never saved any.
    pub fn get(conn: &Connection, user_id: &str) -> Result<UserSettings> {
        let settings = conn
            .query_row(
                "SELECT bot_join_offset_minutes, default_facebook_page_id, \
                 facebook_page_access_token FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(UserSettings {
                        bot_join_offset_minutes: row.get(0)?,
                        default_facebook_page_id: row.get(1)?,
                        facebook_page_access_token: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user settings")?;

        Ok(settings.unwrap_or_default())
    }

    pub fn set_join_offset(conn: &Connection, user_id: &str, minutes: i64) -> Result<()> {
        if minutes < 0 {
            bail!("Bot join offset must not be negative: {}", minutes);
        }

        conn.execute(
            "INSERT INTO users (id, bot_join_offset_minutes, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(id) DO UPDATE SET \
             bot_join_offset_minutes = excluded.bot_join_offset_minutes, \
             updated_at = excluded.updated_at",
            params![user_id, minutes, timestamp(Utc::now())],
        )
        .context("Failed to save bot join offset")?;
        Ok(())
    }

    pub fn set_facebook_page(
        conn: &Connection,
        user_id: &str,
        page_id: &str,
        page_access_token: &str,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO users \
             (id, default_facebook_page_id, facebook_page_access_token, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET \
             default_facebook_page_id = excluded.default_facebook_page_id, \
             facebook_page_access_token = excluded.facebook_page_access_token, \
             updated_at = excluded.updated_at",
            params![user_id, page_id, page_access_token, timestamp(Utc::now())],
        )
        .context("Failed to save Facebook page")?;
        Ok(())
    }
}
