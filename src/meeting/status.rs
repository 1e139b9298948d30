//! Meeting status and its forward-only ordering.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Where a meeting's recording is in the bot lifecycle.
///
/// `Completed` and `Failed` are terminal. Every other status only ever moves
/// forward: SCHEDULED → PROCESSING → TRANSCRIBING → COMPLETED, or
/// SCHEDULED/PROCESSING → FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    Scheduled,
    Processing,
    Transcribing,
    Completed,
    Failed,
}

impl MeetingStatus {
    /// Statuses the reconciliation sweep still cares about.
    pub const ACTIVE: [MeetingStatus; 3] = [
        MeetingStatus::Scheduled,
        MeetingStatus::Processing,
        MeetingStatus::Transcribing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Processing => "PROCESSING",
            Self::Transcribing => "TRANSCRIBING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "PROCESSING" => Ok(Self::Processing),
            "TRANSCRIBING" => Ok(Self::Transcribing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => bail!("Invalid meeting status: {}", s),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is a legal single step from `self`.
    pub fn can_advance_to(&self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Processing)
                | (Self::Scheduled, Self::Failed)
                | (Self::Processing, Self::Transcribing)
                | (Self::Processing, Self::Failed)
                | (Self::Transcribing, Self::Completed)
        )
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
