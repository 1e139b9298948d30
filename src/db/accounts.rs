//! Linked provider accounts.
//!
//! Rows are written by the identity layer after an OAuth exchange; this crate
//! only reads tokens back out and removes rows on disconnect.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::timestamp;

pub const GOOGLE: &str = "google";
pub const LINKEDIN: &str = "linkedin";
pub const FACEBOOK: &str = "facebook";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    pub user_id: String,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<String>,
}

pub struct AccountRepository;

impl AccountRepository {
    pub fn upsert(conn: &Connection, account: &LinkedAccount) -> Result<()> {
        conn.execute(
            "INSERT INTO accounts (user_id, provider, provider_account_id, access_token, \
             refresh_token, expires_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(user_id, provider) DO UPDATE SET \
             provider_account_id = excluded.provider_account_id, \
             access_token = excluded.access_token, refresh_token = excluded.refresh_token, \
             expires_at = excluded.expires_at, updated_at = excluded.updated_at",
            params![
                account.user_id,
                account.provider,
                account.provider_account_id,
                account.access_token,
                account.refresh_token,
                account.expires_at,
                timestamp(Utc::now()),
            ],
        )
        .context("Failed to save linked account")?;
        Ok(())
    }

    pub fn find(conn: &Connection, user_id: &str, provider: &str) -> Result<Option<LinkedAccount>> {
        conn.query_row(
            "SELECT user_id, provider, provider_account_id, access_token, refresh_token, \
             expires_at FROM accounts WHERE user_id = ?1 AND provider = ?2",
            params![user_id, provider],
            |row| {
                Ok(LinkedAccount {
                    user_id: row.get(0)?,
                    provider: row.get(1)?,
                    provider_account_id: row.get(2)?,
                    access_token: row.get(3)?,
                    refresh_token: row.get(4)?,
                    expires_at: row.get(5)?,
                })
            },
        )
        .optional()
        .context("Failed to query linked account")
    }

    pub fn list_providers(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare("SELECT provider FROM accounts WHERE user_id = ?1 ORDER BY provider")
            .context("Failed to prepare linked providers query")?;

        let rows = stmt
            .query_map(params![user_id], |row| row.get(0))
            .context("Failed to list linked providers")?;

        let mut providers = Vec::new();
        for row in rows {
            providers.push(row?);
        }
        Ok(providers)
    }

    pub fn remove(conn: &Connection, user_id: &str, provider: &str) -> Result<bool> {
        let removed = conn
            .execute(
                "DELETE FROM accounts WHERE user_id = ?1 AND provider = ?2",
                params![user_id, provider],
            )
            .context("Failed to remove linked account")?;
        Ok(removed > 0)
    }
}
