//! Recording-bot provider.
//!
//! [`BotLifecycleClient`] is the narrow seam the scheduler and the
//! reconciliation sweep talk through; [`RecallClient`] is the HTTP
//! implementation.

mod client;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use client::RecallClient;
pub use types::{BotSnapshot, BotStatusCode, Recording, TranscriptState};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

#[async_trait]
pub trait BotLifecycleClient: Send + Sync {
    /// Ask the provider to send a bot to `meeting_url` at `join_at`.
    /// Returns the new bot id. Never retried automatically.
    async fn create_bot(
        &self,
        meeting_url: &str,
        join_at: DateTime<Utc>,
    ) -> Result<String, ProviderError>;

    async fn delete_bot(&self, bot_id: &str) -> Result<(), ProviderError>;

    async fn get_bot(&self, bot_id: &str) -> Result<BotSnapshot, ProviderError>;

    /// Start an asynchronous transcript job for a finished recording. `Ok`
    /// means the provider accepted the job.
    async fn create_transcript_job(
        &self,
        recording_id: &str,
        language: &str,
    ) -> Result<(), ProviderError>;

    /// Fetch the raw transcript payload from a download URL.
    async fn download_transcript(&self, url: &str) -> Result<String, ProviderError>;
}
