use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const RECALL_API_KEY_ENV: &str = "RECALL_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const CRON_SECRET_ENV: &str = "MEETSCRIBE_CRON_SECRET";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub recall: RecallConfig,
    pub poller: PollerConfig,
    pub scheduler: SchedulerConfig,
    pub calendar: CalendarConfig,
    pub generation: GenerationConfig,
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `<data_dir>/meetscribe/meetscribe.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub transcript_language: String,
    pub bot_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between in-process sweeps. 0 leaves triggering to the HTTP endpoint.
    pub interval_secs: u64,
    /// Only poll meetings whose scheduled start is already in the past.
    pub require_past_start: bool,
    /// Bearer secret required on `GET /api/cron/poll` when set.
    pub cron_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minutes before the event start the bot joins when the user has no preference.
    pub default_join_offset_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub base_url: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub linkedin_base_url: String,
    pub facebook_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3737,
        }
    }
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://us-west-2.recall.ai/api/v1".to_string(),
            request_timeout_secs: 30,
            transcript_language: "en".to_string(),
            bot_name: "Meetscribe Notetaker".to_string(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            require_past_start: false,
            cron_secret: None,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_join_offset_minutes: 5,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            page_size: 10,
            request_timeout_secs: 15,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            linkedin_base_url: "https://api.linkedin.com/v2".to_string(),
            facebook_base_url: "https://graph.facebook.com".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl RecallConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Config {
    /// Load the config from `path`, or from the default location when `None`.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
            info!("Loaded config from {:?}", config_path);
            config
        } else {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(&config_path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => global::db_file(),
        }
    }

    /// Secrets set in the environment win over the file.
    fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env(RECALL_API_KEY_ENV) {
            self.recall.api_key = Some(key);
        }
        if let Some(key) = non_empty_env(GEMINI_API_KEY_ENV) {
            self.generation.api_key = Some(key);
        }
        if let Some(secret) = non_empty_env(CRON_SECRET_ENV) {
            self.poller.cron_secret = Some(secret);
        }
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
