//! Read-only calendar access.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CalendarConfig;
use crate::meeting::{find_meeting_info, MeetingInfo};

const NO_TITLE: &str = "No Title";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events carry a date only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventTime {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        if let Some(dt) = self.date_time.as_deref() {
            return DateTime::parse_from_rfc3339(dt)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        Some(date.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub response_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hangout_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn title(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_TITLE)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start.instant()
    }

    /// Join link: the conference link, else the first known conferencing URL
    /// in the location or description.
    pub fn meeting_info(&self) -> Option<MeetingInfo> {
        find_meeting_info(
            self.hangout_link.as_deref(),
            &[self.location.as_deref(), self.description.as_deref()],
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Upcoming events from now, soonest first.
    async fn list_upcoming(&self, access_token: &str, page_token: Option<&str>)
        -> Result<EventPage>;
}

pub struct GoogleCalendarClient {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl GoogleCalendarClient {
    pub fn new(config: &CalendarConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("Failed to build calendar HTTP client")?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        info!("Initialized calendar client with base URL: {}", base_url);

        Ok(Self {
            client,
            base_url,
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn list_upcoming(
        &self,
        access_token: &str,
        page_token: Option<&str>,
    ) -> Result<EventPage> {
        let url = format!("{}/calendars/primary/events", self.base_url);
        let time_min = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = self.page_size.to_string();

        let mut query = vec![
            ("timeMin", time_min.as_str()),
            ("maxResults", page_size.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        debug!("Listing calendar events (page token: {:?})", page_token);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .context("Failed to reach calendar API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Calendar API error ({}): {}", status, body));
        }

        response
            .json::<EventPage>()
            .await
            .context("Failed to parse calendar events")
    }
}
