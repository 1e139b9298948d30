//! Generated social posts attached to a meeting.
//!
//! Posts have no owner column; ownership is the owning meeting's `user_id`,
//! so every user-facing query joins through `meetings`.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{conversion_error, timestamp};
use crate::social::SocialPlatform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PUBLISHED" => Ok(Self::Published),
            _ => bail!("Invalid post status: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub id: String,
    pub meeting_id: String,
    pub platform: SocialPlatform,
    pub content: String,
    pub status: PostStatus,
    pub remote_id: Option<String>,
    pub created_at: String,
    pub published_at: Option<String>,
}

const COLUMNS: &str = "p.id, p.meeting_id, p.platform, p.content, p.status, p.remote_id, \
     p.created_at, p.published_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<SocialPost> {
    let platform: String = row.get(2)?;
    let status: String = row.get(4)?;
    Ok(SocialPost {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        platform: SocialPlatform::parse(&platform).map_err(|e| conversion_error(2, e))?,
        content: row.get(3)?,
        status: PostStatus::parse(&status).map_err(|e| conversion_error(4, e))?,
        remote_id: row.get(5)?,
        created_at: row.get(6)?,
        published_at: row.get(7)?,
    })
}

pub struct SocialPostRepository;

impl SocialPostRepository {
    /// Store a new draft for `meeting_id`.
    pub fn create(
        conn: &Connection,
        meeting_id: &str,
        platform: SocialPlatform,
        content: &str,
    ) -> Result<SocialPost> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO social_posts (id, meeting_id, platform, content, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                meeting_id,
                platform.as_str(),
                content,
                PostStatus::Draft.as_str(),
                timestamp(Utc::now()),
            ],
        )
        .context("Failed to insert social post")?;

        conn.query_row(
            &format!("SELECT {COLUMNS} FROM social_posts p WHERE p.id = ?1"),
            params![id],
            map_row,
        )
        .context("Social post missing after insert")
    }

    pub fn list_for_meeting(
        conn: &Connection,
        user_id: &str,
        meeting_id: &str,
    ) -> Result<Vec<SocialPost>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM social_posts p JOIN meetings m ON m.id = p.meeting_id \
                 WHERE p.meeting_id = ?1 AND m.user_id = ?2 ORDER BY p.created_at ASC, p.rowid ASC"
            ))
            .context("Failed to prepare social posts query")?;

        let rows = stmt
            .query_map(params![meeting_id, user_id], map_row)
            .context("Failed to list social posts")?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    pub fn get_for_user(conn: &Connection, user_id: &str, id: &str) -> Result<Option<SocialPost>> {
        conn.query_row(
            &format!(
                "SELECT {COLUMNS} FROM social_posts p JOIN meetings m ON m.id = p.meeting_id \
                 WHERE p.id = ?1 AND m.user_id = ?2"
            ),
            params![id, user_id],
            map_row,
        )
        .optional()
        .context("Failed to query social post")
    }

    pub fn update_content(
        conn: &Connection,
        user_id: &str,
        id: &str,
        content: &str,
    ) -> Result<Option<SocialPost>> {
        let changed = conn
            .execute(
                "UPDATE social_posts SET content = ?3 WHERE id = ?1 AND meeting_id IN \
                 (SELECT id FROM meetings WHERE user_id = ?2)",
                params![id, user_id, content],
            )
            .context("Failed to update social post")?;

        if changed == 0 {
            return Ok(None);
        }
        Self::get_for_user(conn, user_id, id)
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> Result<bool> {
        let removed = conn
            .execute(
                "DELETE FROM social_posts WHERE id = ?1 AND meeting_id IN \
                 (SELECT id FROM meetings WHERE user_id = ?2)",
                params![id, user_id],
            )
            .context("Failed to delete social post")?;
        Ok(removed > 0)
    }

    /// Remove every unpublished post of a meeting. Returns how many went.
    pub fn delete_drafts(conn: &Connection, user_id: &str, meeting_id: &str) -> Result<usize> {
        conn.execute(
            "DELETE FROM social_posts WHERE meeting_id = ?1 AND status = ?3 AND meeting_id IN \
             (SELECT id FROM meetings WHERE user_id = ?2)",
            params![meeting_id, user_id, PostStatus::Draft.as_str()],
        )
        .context("Failed to delete draft social posts")
    }

    pub fn mark_published(conn: &Connection, id: &str, remote_id: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE social_posts SET status = ?2, remote_id = ?3, published_at = ?4 \
                 WHERE id = ?1",
                params![
                    id,
                    PostStatus::Published.as_str(),
                    remote_id,
                    timestamp(Utc::now())
                ],
            )
            .context("Failed to mark social post published")?;
        Ok(changed > 0)
    }
}
