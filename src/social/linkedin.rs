use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{http_client, PublishTarget, SocialPlatform, SocialPublisher};
use crate::config::SocialConfig;

#[derive(Debug, Default, Deserialize)]
struct UgcPostResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Posts as a member through the `ugcPosts` API.
pub struct LinkedInPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl LinkedInPublisher {
    pub fn new(config: &SocialConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.linkedin_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SocialPublisher for LinkedInPublisher {
    fn platform(&self) -> SocialPlatform {
        SocialPlatform::LinkedIn
    }

    async fn publish(&self, target: &PublishTarget, content: &str) -> Result<String> {
        let body = json!({
            "author": format!("urn:li:person:{}", target.account_id),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": content },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "CONNECTIONS"
            }
        });

        let response = self
            .client
            .post(format!("{}/ugcPosts", self.base_url))
            .bearer_auth(&target.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await
            .context("Failed to reach LinkedIn")?;

        let status = response.status();
        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("LinkedIn API error ({}): {}", status, body));
        }

        let parsed: UgcPostResponse = response.json().await.unwrap_or_default();
        let id = header_id
            .or(parsed.id)
            .ok_or_else(|| anyhow!("LinkedIn did not return a post id"))?;

        info!("Published LinkedIn post {}", id);
        Ok(id)
    }
}
