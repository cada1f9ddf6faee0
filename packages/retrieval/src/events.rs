//! Best-effort event detection from document text.
//!
//! The oracle is told to reply with a bare JSON array, but in practice
//! replies sometimes arrive wrapped in markdown fences. Parsing is
//! isolated to one step: strip the wrapper, parse the strict schema,
//! reject the whole reply on any shape mismatch. Timestamps inside an
//! otherwise valid event are the only tolerated sloppiness; an
//! unparseable RFC3339 string degrades to `None`.
//!
//! Detection never blocks ingestion; callers log failures and move on.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::pipeline::prompts::event_detection_prompt;
use crate::traits::ai::CompletionModel;

/// Default minimum confidence for persisting a detected event.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// A detected event before it is attached to a user and document.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub confidence: f32,
    pub source_text: String,
}

/// Wire schema the oracle is instructed to produce.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEvent {
    title: String,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    location: Option<String>,
    confidence: f32,
    source_text: String,
}

/// Strip a markdown code fence (``` or ```json) wrapping `raw`, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Parse an oracle reply into event drafts.
///
/// Any schema mismatch (missing required field, wrong type, unknown
/// field, non-array) rejects the whole reply.
pub fn parse_events(raw: &str) -> std::result::Result<Vec<EventDraft>, serde_json::Error> {
    let cleaned = strip_code_fence(raw);
    let raw_events: Vec<RawEvent> = serde_json::from_str(cleaned)?;

    Ok(raw_events
        .into_iter()
        .map(|e| EventDraft {
            title: e.title,
            start_time: parse_time(e.start_time.as_deref()),
            end_time: parse_time(e.end_time.as_deref()),
            location: e.location,
            confidence: e.confidence,
            source_text: e.source_text,
        })
        .collect())
}

/// Ask the oracle for events in `text` and parse its reply.
pub async fn detect_events(
    model: &dyn CompletionModel,
    text: &str,
) -> Result<Vec<EventDraft>> {
    let reply = model.complete(&event_detection_prompt(text)).await?;
    let events = parse_events(&reply)?;

    tracing::debug!(count = events.len(), "event detection completed");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {
            "title": "Math exam",
            "start_time": "2026-09-04T10:00:00Z",
            "end_time": null,
            "location": "Room 4",
            "confidence": 0.92,
            "source_text": "Exam on Friday at 10am in Room 4"
        }
    ]"#;

    #[test]
    fn parses_plain_array() {
        let events = parse_events(VALID).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.title, "Math exam");
        assert!(event.start_time.is_some());
        assert!(event.end_time.is_none());
        assert_eq!(event.location.as_deref(), Some("Room 4"));
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_events(&fenced).unwrap().len(), 1);

        let bare_fence = format!("```\n{VALID}\n```");
        assert_eq!(parse_events(&bare_fence).unwrap().len(), 1);
    }

    #[test]
    fn empty_array_is_no_events() {
        assert!(parse_events("[]").unwrap().is_empty());
        assert!(parse_events("```json\n[]\n```").unwrap().is_empty());
    }

    #[test]
    fn rejects_shape_mismatches() {
        // Not an array.
        assert!(parse_events(r#"{"title": "x"}"#).is_err());
        // Missing required field.
        assert!(parse_events(r#"[{"title": "x"}]"#).is_err());
        // Unknown field.
        assert!(parse_events(
            r#"[{"title":"x","confidence":0.9,"source_text":"s","bogus":1}]"#
        )
        .is_err());
        // Conversational wrapper.
        assert!(parse_events("Sure! Here are the events: []").is_err());
    }

    #[test]
    fn bad_timestamp_degrades_to_none() {
        let events = parse_events(
            r#"[{"title":"x","start_time":"next Friday","confidence":0.8,"source_text":"s"}]"#,
        )
        .unwrap();
        assert!(events[0].start_time.is_none());
    }

    #[tokio::test]
    async fn detect_events_drives_the_oracle() {
        let model = crate::testing::MockCompletion::replying(VALID);
        let events = detect_events(&model, "Exam on Friday at 10am in Room 4")
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }
}
