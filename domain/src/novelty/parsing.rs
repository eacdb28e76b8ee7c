//! Strict extraction of batch payloads from free-text agent output.
//!
//! The agent is asked to answer with:
//!
//! ```json
//! {"current_item": "...", "future_items": ["...", "..."], "item_type": "joke"}
//! ```
//!
//! Candidates are tried in order: a fenced ` ```json ` block, the whole text,
//! then the outermost `{ ... }` span. A candidate either matches the shape
//! exactly or is rejected; nothing is partially trusted.

use serde::Deserialize;
use thiserror::Error;

/// Why a response did not yield a batch payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchParseError {
    #[error("no JSON object found in response")]
    NoJson,
    #[error("payload does not match the batch shape: {0}")]
    Shape(String),
    #[error("payload field `{0}` is empty")]
    EmptyField(&'static str),
}

/// A parsed batch payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPayload {
    pub current_item: String,
    pub future_items: Vec<String>,
    pub item_type: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPayload {
    current_item: String,
    future_items: Vec<String>,
    item_type: String,
}

/// Parse a batch payload out of `text`.
pub fn parse_batch_payload(text: &str) -> Result<BatchPayload, BatchParseError> {
    let candidates = candidate_spans(text);
    if candidates.is_empty() {
        return Err(BatchParseError::NoJson);
    }

    let mut last_err = BatchParseError::NoJson;
    for candidate in candidates {
        match serde_json::from_str::<RawPayload>(candidate) {
            Ok(raw) => return validate(raw),
            Err(e) => last_err = BatchParseError::Shape(e.to_string()),
        }
    }
    Err(last_err)
}

fn validate(raw: RawPayload) -> Result<BatchPayload, BatchParseError> {
    let current_item = raw.current_item.trim().to_string();
    if current_item.is_empty() {
        return Err(BatchParseError::EmptyField("current_item"));
    }
    let item_type = raw.item_type.trim().to_string();
    if item_type.is_empty() {
        return Err(BatchParseError::EmptyField("item_type"));
    }

    let mut future_items: Vec<String> = Vec::with_capacity(raw.future_items.len());
    for item in raw.future_items {
        let item = item.trim();
        if item.is_empty() {
            return Err(BatchParseError::EmptyField("future_items"));
        }
        if item != current_item && !future_items.iter().any(|existing| existing == item) {
            future_items.push(item.to_string());
        }
    }

    Ok(BatchPayload {
        current_item,
        future_items,
        item_type,
    })
}

fn candidate_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();

    if let Some(block) = fenced_json_block(text) {
        spans.push(block);
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        spans.push(trimmed);
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && start < end
    {
        let span = &text[start..=end];
        if !spans.contains(&span) {
            spans.push(span);
        }
    }

    spans
}

fn fenced_json_block(text: &str) -> Option<&str> {
    let open = text.find("```json")?;
    let body_start = open + "```json".len();
    let close = text[body_start..].find("```")?;
    Some(text[body_start..body_start + close].trim())
}
