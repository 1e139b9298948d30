//! Conferencing link detection.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Conferencing platform a join link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Zoom,
    #[serde(rename = "Google Meet")]
    GoogleMeet,
    #[serde(rename = "Microsoft Teams")]
    MicrosoftTeams,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zoom => "Zoom",
            Self::GoogleMeet => "Google Meet",
            Self::MicrosoftTeams => "Microsoft Teams",
            Self::Unknown => "Unknown",
        }
    }

    /// Lenient: anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "Zoom" => Self::Zoom,
            "Google Meet" => Self::GoogleMeet,
            "Microsoft Teams" => Self::MicrosoftTeams,
            _ => Self::Unknown,
        }
    }

    pub fn from_link(link: &str) -> Self {
        if link.contains("zoom.us") {
            Self::Zoom
        } else if link.contains("meet.google.com") {
            Self::GoogleMeet
        } else if link.contains("teams.microsoft.com") {
            Self::MicrosoftTeams
        } else {
            Self::Unknown
        }
    }
}

/// A join link together with the platform it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingInfo {
    pub link: String,
    pub platform: Platform,
}

impl MeetingInfo {
    pub fn from_link(link: impl Into<String>) -> Self {
        let link = link.into();
        let platform = Platform::from_link(&link);
        Self { link, platform }
    }
}

fn meeting_url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"https://(?:[a-zA-Z0-9-]+\.)?(?:zoom\.us|meet\.google\.com|teams\.microsoft\.com)/[^\s,"]+"#,
        )
        .ok()
    })
    .as_ref()
}

/// Finds a join link: the conference link when present, otherwise the first
/// known conferencing URL in the free-text fields.
pub fn find_meeting_info(
    conference_link: Option<&str>,
    free_text: &[Option<&str>],
) -> Option<MeetingInfo> {
    if let Some(link) = conference_link.filter(|l| !l.trim().is_empty()) {
        return Some(MeetingInfo::from_link(link.trim()));
    }

    let haystack = free_text
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    meeting_url_regex()?
        .find(&haystack)
        .map(|m| MeetingInfo::from_link(m.as_str()))
}
