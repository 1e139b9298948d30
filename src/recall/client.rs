use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{BotLifecycleClient, BotSnapshot, ProviderError};
use crate::config::{RecallConfig, RECALL_API_KEY_ENV};

/// Request body for creating a bot
#[derive(Debug, Serialize)]
struct CreateBotRequest<'a> {
    meeting_url: &'a str,
    join_at: String,
    bot_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateBotResponse {
    id: String,
}

pub struct RecallClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    bot_name: String,
}

impl RecallClient {
    pub fn new(api_key: String, config: &RecallConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build Recall HTTP client")?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        info!("Initialized Recall client with base URL: {}", base_url);

        Ok(Self {
            client,
            api_key,
            base_url,
            bot_name: config.bot_name.clone(),
        })
    }

    pub fn from_config(config: &RecallConfig) -> Result<Self> {
        let api_key = config.api_key.clone().with_context(|| {
            format!(
                "Recall API key not configured. Set recall.api_key or {}",
                RECALL_API_KEY_ENV
            )
        })?;
        Self::new(api_key, config)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.api_key)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let text = response
            .text()
            .await
            .map_err(|source| ProviderError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl BotLifecycleClient for RecallClient {
    async fn create_bot(
        &self,
        meeting_url: &str,
        join_at: DateTime<Utc>,
    ) -> Result<String, ProviderError> {
        let endpoint = format!("{}/bot/", self.base_url);
        let body = CreateBotRequest {
            meeting_url,
            join_at: join_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            bot_name: &self.bot_name,
        };

        debug!("Creating bot for {} joining at {}", meeting_url, body.join_at);

        let request = self
            .client
            .post(&endpoint)
            .header("Authorization", self.auth_header())
            .json(&body);
        let response = self.send(&endpoint, request).await?;
        let created: CreateBotResponse = Self::decode(&endpoint, response).await?;

        info!("Created bot {} for {}", created.id, meeting_url);
        Ok(created.id)
    }

    async fn delete_bot(&self, bot_id: &str) -> Result<(), ProviderError> {
        let endpoint = format!("{}/bot/{}/", self.base_url, bot_id);
        let request = self
            .client
            .delete(&endpoint)
            .header("Authorization", self.auth_header());
        self.send(&endpoint, request).await?;

        info!("Deleted bot {}", bot_id);
        Ok(())
    }

    async fn get_bot(&self, bot_id: &str) -> Result<BotSnapshot, ProviderError> {
        let endpoint = format!("{}/bot/{}/", self.base_url, bot_id);
        let request = self
            .client
            .get(&endpoint)
            .header("Authorization", self.auth_header());
        let response = self.send(&endpoint, request).await?;
        Self::decode(&endpoint, response).await
    }

    async fn create_transcript_job(
        &self,
        recording_id: &str,
        language: &str,
    ) -> Result<(), ProviderError> {
        let endpoint = format!(
            "{}/recording/{}/create_transcript/",
            self.base_url, recording_id
        );
        let body = json!({
            "provider": {
                "recallai_async": { "language_code": language }
            }
        });

        let request = self
            .client
            .post(&endpoint)
            .header("Authorization", self.auth_header())
            .json(&body);
        self.send(&endpoint, request).await?;

        info!("Transcript job accepted for recording {}", recording_id);
        Ok(())
    }

    async fn download_transcript(&self, url: &str) -> Result<String, ProviderError> {
        // Pre-signed URL; the provider token must not be sent along.
        let response = self.send(url, self.client.get(url)).await?;
        response
            .text()
            .await
            .map_err(|source| ProviderError::Transport {
                endpoint: url.to_string(),
                source,
            })
    }
}
