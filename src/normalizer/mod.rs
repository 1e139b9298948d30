//! Renders a stored transcript payload as speaker-labelled text.
//!
//! The payload is the provider's JSON verbatim: a list of speaker turns, each
//! with a list of word tokens. Rendering never fails; missing or unreadable
//! payloads come back as a fixed placeholder.

use serde::Deserialize;
use tracing::debug;

pub const TRANSCRIPT_UNAVAILABLE: &str = "Transcript not available.";
pub const TRANSCRIPT_MALFORMED: &str = "Transcript could not be read.";

const UNKNOWN_SPEAKER: &str = "Unknown Speaker";

#[derive(Debug, Deserialize)]
struct Turn {
    #[serde(default)]
    participant: Option<Participant>,
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Participant {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Word {
    text: String,
}

impl Turn {
    fn speaker(&self) -> &str {
        self.participant
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .or(self.speaker.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SPEAKER)
    }
}

/// Some stored payloads are a JSON string wrapping the JSON array.
fn parse_turns(raw: &str) -> Option<Vec<Turn>> {
    match serde_json::from_str::<serde_json::Value>(raw).ok()? {
        serde_json::Value::String(inner) => serde_json::from_str(&inner).ok(),
        value => serde_json::from_value(value).ok(),
    }
}

pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return TRANSCRIPT_UNAVAILABLE.to_string();
    };

    let Some(turns) = parse_turns(raw) else {
        debug!("Transcript payload is not a list of turns ({} bytes)", raw.len());
        return TRANSCRIPT_MALFORMED.to_string();
    };

    let text = turns
        .iter()
        .map(|turn| {
            let words = turn
                .words
                .iter()
                .map(|w| w.text.trim())
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}: {}", turn.speaker(), words)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn() {
        let raw = r#"[{"participant":{"name":"Alice"},"words":[{"text":"Hi"},{"text":"there"}]}]"#;
        assert_eq!(normalize(Some(raw)), "Alice: Hi there");
    }

    #[test]
    fn test_multiple_turns() {
        let raw = r#"[
            {"participant":{"id":1,"name":"Alice"},"words":[{"text":"Ready?","start_timestamp":{"relative":0.1}}]},
            {"participant":{"id":2,"name":"Bob"},"words":[{"text":"Yes,"},{"text":"go"}]}
        ]"#;
        assert_eq!(normalize(Some(raw)), "Alice: Ready?\n\nBob: Yes, go");
    }

    #[test]
    fn test_speaker_fallbacks() {
        let raw = r#"[
            {"speaker":"Carol","words":[{"text":"one"}]},
            {"participant":{"name":null},"words":[{"text":"two"}]},
            {"words":[{"text":"three"}]}
        ]"#;
        assert_eq!(
            normalize(Some(raw)),
            "Carol: one\n\nUnknown Speaker: two\n\nUnknown Speaker: three"
        );
    }

    #[test]
    fn test_double_encoded_payload() {
        let inner = r#"[{"participant":{"name":"Alice"},"words":[{"text":"Hi"}]}]"#;
        let raw = serde_json::to_string(inner).unwrap();
        assert_eq!(normalize(Some(&raw)), "Alice: Hi");
    }

    #[test]
    fn test_placeholders_differ() {
        let absent = normalize(None);
        let malformed = normalize(Some("not json"));
        assert_eq!(absent, TRANSCRIPT_UNAVAILABLE);
        assert_eq!(malformed, TRANSCRIPT_MALFORMED);
        assert_ne!(absent, malformed);
        assert_eq!(normalize(Some("  ")), TRANSCRIPT_UNAVAILABLE);
        assert_eq!(normalize(Some(r#"{"not":"a list"}"#)), TRANSCRIPT_MALFORMED);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(normalize(Some("[]")), "");
    }

    #[test]
    fn test_idempotent() {
        let raw = r#"[{"participant":{"name":"Alice"},"words":[{"text":"Hi"}]}]"#;
        assert_eq!(normalize(Some(raw)), normalize(Some(raw)));
    }
}
