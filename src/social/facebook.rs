use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{http_client, PublishTarget, SocialPlatform, SocialPublisher};
use crate::config::SocialConfig;

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

/// Posts to a page feed through the Graph API.
pub struct FacebookPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl FacebookPublisher {
    pub fn new(config: &SocialConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.facebook_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SocialPublisher for FacebookPublisher {
    fn platform(&self) -> SocialPlatform {
        SocialPlatform::Facebook
    }

    async fn publish(&self, target: &PublishTarget, content: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{}/feed", self.base_url, target.account_id))
            .json(&json!({
                "message": content,
                "access_token": target.access_token,
            }))
            .send()
            .await
            .context("Failed to reach Facebook")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Facebook response")?;

        // Graph API errors carry a message even on non-2xx responses.
        let parsed: FeedResponse = serde_json::from_str(&text)
            .map_err(|_| anyhow!("Facebook API error ({}): {}", status, text))?;
        if let Some(error) = parsed.error {
            return Err(anyhow!("Facebook API error: {}", error.message));
        }
        if !status.is_success() {
            return Err(anyhow!("Facebook API error ({}): {}", status, text));
        }

        let id = parsed
            .id
            .ok_or_else(|| anyhow!("Facebook did not return a post id"))?;

        info!("Published Facebook post {}", id);
        Ok(id)
    }
}
