//! Pure transition rules: given where a meeting is and what the provider
//! says about its bot, decide the single next step.

use crate::meeting::MeetingStatus;
use crate::recall::{BotSnapshot, TranscriptState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do yet; look again next sweep.
    Hold { reason: &'static str },
    /// Nothing to do, but the provider reported something an operator
    /// should see.
    Stalled { reason: String },
    MarkProcessing,
    MarkFailed { reason: String },
    /// Start a transcript job, then move to TRANSCRIBING.
    RequestTranscript { recording_id: String },
    /// The recording already has a transcript artifact; move to
    /// TRANSCRIBING without starting another job.
    AdoptTranscript { recording_id: String },
    /// Download the transcript and move to COMPLETED.
    Complete {
        recording_id: String,
        download_url: String,
    },
}

impl Step {
    /// Status the step leads to, if it leads anywhere.
    pub fn target(&self) -> Option<MeetingStatus> {
        match self {
            Self::Hold { .. } | Self::Stalled { .. } => None,
            Self::MarkProcessing => Some(MeetingStatus::Processing),
            Self::MarkFailed { .. } => Some(MeetingStatus::Failed),
            Self::RequestTranscript { .. } | Self::AdoptTranscript { .. } => {
                Some(MeetingStatus::Transcribing)
            }
            Self::Complete { .. } => Some(MeetingStatus::Completed),
        }
    }
}

fn fatal(bot: &BotSnapshot) -> Step {
    Step::MarkFailed {
        reason: format!(
            "bot reported a fatal error ({})",
            bot.fatal_reason().unwrap_or("no sub code")
        ),
    }
}

/// `tracked_recording` is the recording a transcript was requested for, if
/// the meeting has reached TRANSCRIBING.
pub fn next_step(
    status: MeetingStatus,
    tracked_recording: Option<&str>,
    bot: &BotSnapshot,
) -> Step {
    match status {
        MeetingStatus::Scheduled => {
            if bot.fatal() {
                fatal(bot)
            } else if bot.call_ended() {
                Step::MarkProcessing
            } else {
                Step::Hold {
                    reason: "call has not ended",
                }
            }
        }

        MeetingStatus::Processing => {
            if bot.fatal() {
                return fatal(bot);
            }
            if bot.call_ended() && bot.recordings.is_empty() {
                return Step::MarkFailed {
                    reason: "call ended without any recording".to_string(),
                };
            }

            let Some(recording) = bot.ready_recording() else {
                return Step::Hold {
                    reason: "no recording is done yet",
                };
            };
            let recording_id = recording.id.clone();

            match recording.transcript_state() {
                TranscriptState::Absent | TranscriptState::Failed => {
                    Step::RequestTranscript { recording_id }
                }
                TranscriptState::Pending
                | TranscriptState::Ready { .. }
                | TranscriptState::MissingUrl => Step::AdoptTranscript { recording_id },
            }
        }

        MeetingStatus::Transcribing => {
            // Untracked rows (legacy, or re-enabled with a new bot) fall back
            // to the first finished recording.
            let recording = match tracked_recording {
                Some(id) => match bot.recording(id) {
                    Some(recording) => recording,
                    None => {
                        return Step::Stalled {
                            reason: format!("bot {} does not report recording {}", bot.id, id),
                        }
                    }
                },
                None => match bot.ready_recording() {
                    Some(recording) => recording,
                    None => {
                        return Step::Hold {
                            reason: "no finished recording reported",
                        }
                    }
                },
            };

            match recording.transcript_state() {
                TranscriptState::Ready { download_url } => Step::Complete {
                    recording_id: recording.id.clone(),
                    download_url,
                },
                TranscriptState::Pending => Step::Hold {
                    reason: "transcript job still running",
                },
                TranscriptState::Absent => Step::Hold {
                    reason: "transcript job not visible yet",
                },
                TranscriptState::MissingUrl => Step::Stalled {
                    reason: format!(
                        "transcript for recording {} is done but has no download URL",
                        recording.id
                    ),
                },
                TranscriptState::Failed => Step::Stalled {
                    reason: format!("transcript job for recording {} failed", recording.id),
                },
            }
        }

        MeetingStatus::Completed | MeetingStatus::Failed => Step::Hold {
            reason: "meeting is terminal",
        },
    }
}
