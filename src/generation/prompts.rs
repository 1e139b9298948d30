//! Prompt templates for follow-up content.

pub fn follow_up_email(transcript: &str) -> String {
    format!(
        r#"You are helping a professional who has just left a meeting write the follow-up email.
Write as one of the participants ("I" / "we"), addressed to a client or colleague who attended.

Rules:
1. Skip procedural detail (motions, vote counts, agenda approval). Keep only decisions, action items and next steps a stakeholder cares about.
2. Open with "Hi [Recipient Name],".
3. Summarise the one to three most important decisions or topics.
4. List action items with owners where the transcript names them, and any agreed next steps.
5. Close with "Best regards," and sign as "[Your Name]". Never take names for the signature from the transcript.
6. Friendly, professional and forward-looking tone.

Transcript:
---
{transcript}
---"#
    )
}

pub fn social_post(instructions: &str, example: Option<&str>, transcript: &str) -> String {
    let example = example
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| format!("\nExample of the desired style:\n---\n{e}\n---\n"))
        .unwrap_or_default();

    format!(
        r#"You write social media posts for a professional (for example a financial advisor) based on their meetings.
Follow the user's instructions to turn the transcript below into one post.

User's instructions:
---
{instructions}
---
{example}
Meeting transcript:
---
{transcript}
---

Reply with the text of the post only: no title, no alternatives, no commentary."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_prompt_embeds_transcript() {
        let prompt = follow_up_email("Alice: ship it friday");
        assert!(prompt.contains("Alice: ship it friday"));
        assert!(prompt.contains("[Your Name]"));
    }

    #[test]
    fn test_social_prompt_example_is_optional() {
        let with = social_post("Keep it short", Some("We did it!"), "Bob: done");
        assert!(with.contains("Keep it short"));
        assert!(with.contains("We did it!"));

        let without = social_post("Keep it short", Some("   "), "Bob: done");
        assert!(!without.contains("Example of the desired style"));
    }
}
