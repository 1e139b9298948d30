//! Publishing generated posts to social networks.

mod facebook;
mod linkedin;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use facebook::FacebookPublisher;
pub use linkedin::LinkedInPublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialPlatform {
    #[serde(rename = "LINKEDIN")]
    LinkedIn,
    #[serde(rename = "FACEBOOK")]
    Facebook,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedIn => "LINKEDIN",
            Self::Facebook => "FACEBOOK",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "LINKEDIN" => Ok(Self::LinkedIn),
            "FACEBOOK" => Ok(Self::Facebook),
            _ => bail!("Invalid social platform: {}", s),
        }
    }
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and as whom to publish: the LinkedIn member id or Facebook page id,
/// and the token that may post there.
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub account_id: String,
    pub access_token: String,
}

#[async_trait]
pub trait SocialPublisher: Send + Sync {
    fn platform(&self) -> SocialPlatform;

    /// Publish `content`. Returns the id the network assigned to the post.
    async fn publish(&self, target: &PublishTarget, content: &str) -> Result<String>;
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .context("Failed to build social HTTP client")
}
