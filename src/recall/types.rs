//! Bot status payload as returned by `GET /bot/{id}/`.
//!
//! Only the fields the sweep acts on are decoded. Codes the provider adds
//! later land in an `Other` variant; objects it leaves out decode to `None`
//! and surface as [`TranscriptState::Absent`] rather than as an error.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BotSnapshot {
    pub id: String,
    #[serde(default)]
    pub status_changes: Vec<StatusChange>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub code: BotStatusCode,
    #[serde(default)]
    pub sub_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatusCode {
    Ready,
    JoiningCall,
    InWaitingRoom,
    InCallNotRecording,
    InCallRecording,
    CallEnded,
    Done,
    Fatal,
    #[serde(other)]
    Other,
}

/// Status code shared by recordings and their media artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatusCode {
    Processing,
    Done,
    Failed,
    Deleted,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusField {
    pub code: ArtifactStatusCode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recording {
    pub id: String,
    #[serde(default)]
    pub status: Option<StatusField>,
    #[serde(default)]
    pub media_shortcuts: Option<MediaShortcuts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaShortcuts {
    #[serde(default)]
    pub transcript: Option<TranscriptArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptArtifact {
    #[serde(default)]
    pub status: Option<StatusField>,
    #[serde(default)]
    pub data: Option<ArtifactData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactData {
    #[serde(default)]
    pub download_url: Option<String>,
}

/// What a recording says about its transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptState {
    /// No transcript artifact, or one without a status yet.
    Absent,
    Pending,
    Ready { download_url: String },
    /// Reported done but carries no download URL.
    MissingUrl,
    Failed,
}

impl Recording {
    pub fn is_done(&self) -> bool {
        matches!(
            self.status.as_ref().map(|s| s.code),
            Some(ArtifactStatusCode::Done)
        )
    }

    pub fn transcript_state(&self) -> TranscriptState {
        let Some(artifact) = self
            .media_shortcuts
            .as_ref()
            .and_then(|m| m.transcript.as_ref())
        else {
            return TranscriptState::Absent;
        };

        match artifact.status.as_ref().map(|s| s.code) {
            None => TranscriptState::Absent,
            Some(ArtifactStatusCode::Done) => match artifact
                .data
                .as_ref()
                .and_then(|d| d.download_url.as_deref())
                .filter(|url| !url.is_empty())
            {
                Some(url) => TranscriptState::Ready {
                    download_url: url.to_string(),
                },
                None => TranscriptState::MissingUrl,
            },
            Some(ArtifactStatusCode::Failed) | Some(ArtifactStatusCode::Deleted) => {
                TranscriptState::Failed
            }
            Some(ArtifactStatusCode::Processing) | Some(ArtifactStatusCode::Other) => {
                TranscriptState::Pending
            }
        }
    }
}

impl BotSnapshot {
    fn has_code(&self, code: BotStatusCode) -> bool {
        self.status_changes.iter().any(|c| c.code == code)
    }

    /// The bot has left the call. `done` implies `call_ended` even if the
    /// provider collapsed the two events.
    pub fn call_ended(&self) -> bool {
        self.has_code(BotStatusCode::CallEnded) || self.has_code(BotStatusCode::Done)
    }

    pub fn fatal(&self) -> bool {
        self.has_code(BotStatusCode::Fatal)
    }

    /// Sub-code of the first fatal event, for logging.
    pub fn fatal_reason(&self) -> Option<&str> {
        self.status_changes
            .iter()
            .find(|c| c.code == BotStatusCode::Fatal)
            .and_then(|c| c.sub_code.as_deref())
    }

    /// First recording that has finished processing.
    pub fn ready_recording(&self) -> Option<&Recording> {
        self.recordings.iter().find(|r| r.is_done())
    }

    pub fn recording(&self, id: &str) -> Option<&Recording> {
        self.recordings.iter().find(|r| r.id == id)
    }
}
