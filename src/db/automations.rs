//! Saved social-post generation recipes.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use super::{conversion_error, timestamp};
use crate::social::SocialPlatform;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub platform: SocialPlatform,
    pub prompt: String,
    pub example: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct AutomationInput {
    pub name: String,
    pub platform: SocialPlatform,
    pub prompt: String,
    pub example: Option<String>,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Automation> {
    let platform: String = row.get(3)?;
    Ok(Automation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        platform: SocialPlatform::parse(&platform).map_err(|e| conversion_error(3, e))?,
        prompt: row.get(4)?,
        example: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub struct AutomationRepository;

impl AutomationRepository {
    pub fn create(conn: &Connection, user_id: &str, input: &AutomationInput) -> Result<Automation> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO automations (id, user_id, name, platform, prompt, example, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                user_id,
                input.name,
                input.platform.as_str(),
                input.prompt,
                input.example,
                timestamp(Utc::now()),
            ],
        )
        .context("Failed to insert automation")?;

        Self::get_for_user(conn, user_id, &id)?.context("Automation missing after insert")
    }

    pub fn get_for_user(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Automation>> {
        conn.query_row(
            "SELECT id, user_id, name, platform, prompt, example, created_at \
             FROM automations WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            map_row,
        )
        .optional()
        .context("Failed to query automation")
    }

    pub fn list(conn: &Connection, user_id: &str) -> Result<Vec<Automation>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, name, platform, prompt, example, created_at \
                 FROM automations WHERE user_id = ?1 ORDER BY created_at DESC, name",
            )
            .context("Failed to prepare automations query")?;

        let rows = stmt
            .query_map(params![user_id], map_row)
            .context("Failed to list automations")?;

        let mut automations = Vec::new();
        for row in rows {
            automations.push(row?);
        }
        Ok(automations)
    }

    /// Returns the updated automation, or `None` if the user has no such id.
    pub fn update(
        conn: &Connection,
        user_id: &str,
        id: &str,
        input: &AutomationInput,
    ) -> Result<Option<Automation>> {
        let changed = conn
            .execute(
                "UPDATE automations SET name = ?3, platform = ?4, prompt = ?5, example = ?6 \
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    id,
                    user_id,
                    input.name,
                    input.platform.as_str(),
                    input.prompt,
                    input.example,
                ],
            )
            .context("Failed to update automation")?;

        if changed == 0 {
            return Ok(None);
        }
        Self::get_for_user(conn, user_id, id)
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let removed = conn
            .execute(
                "DELETE FROM automations WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .context("Failed to delete automation")?;
        Ok(removed > 0)
    }
}
