//! Caller-facing streaming protocol.
//!
//! Every dispatch produces zero or more progress events (`content-delta`,
//! `tool-invoked`, `tool-result`, `synthesis-complete`) followed by exactly
//! one terminal event (`done` or `failed`). Serialized as one JSON object per
//! event with a `type` discriminator:
//!
//! ```json
//! {"type":"content-delta","text":"Hel"}
//! {"type":"done","text":"Hello","agent":"general","rationale":"...","candidates":["general"],"metadata":{"elapsed_ms":812}}
//! ```

use crate::session::usage::Usage;
use serde::{Deserialize, Serialize};

/// Aggregated timing and usage for a finished dispatch.
///
/// Fields the substrate did not report are omitted, not zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(flatten)]
    pub usage: Usage,
}

/// Payload of the terminal `done` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneEvent {
    /// Full concatenated response text.
    pub text: String,
    /// Name of the agent that produced it.
    pub agent: String,
    /// Why that agent was selected.
    pub rationale: String,
    /// Every candidate the selector considered.
    pub candidates: Vec<String>,
    #[serde(default)]
    pub metadata: DoneMetadata,
}

/// One event of the caller-facing stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    ContentDelta { text: String },
    ToolInvoked { tool: String },
    /// Carries a bounded summary of the tool output, never the raw payload.
    ToolResult { tool: String, summary: String },
    SynthesisComplete,
    Done(DoneEvent),
    Failed { error: String },
}

impl StreamEvent {
    pub fn failed(error: impl Into<String>) -> Self {
        StreamEvent::Failed {
            error: error.into(),
        }
    }

    /// Returns true for `done` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done(_) | StreamEvent::Failed { .. })
    }

    /// The `type` discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::ContentDelta { .. } => "content-delta",
            StreamEvent::ToolInvoked { .. } => "tool-invoked",
            StreamEvent::ToolResult { .. } => "tool-result",
            StreamEvent::SynthesisComplete => "synthesis-complete",
            StreamEvent::Done(_) => "done",
            StreamEvent::Failed { .. } => "failed",
        }
    }

    /// Convert a terminal event into the synchronous result shape.
    pub fn into_result(self) -> Option<DispatchResult> {
        match self {
            StreamEvent::Done(done) => Some(DispatchResult::Done(done)),
            StreamEvent::Failed { error } => Some(DispatchResult::Failed { error }),
            _ => None,
        }
    }
}

/// Result for non-streaming callers: equivalent to the terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DispatchResult {
    Done(DoneEvent),
    Failed { error: String },
}

impl DispatchResult {
    pub fn is_done(&self) -> bool {
        matches!(self, DispatchResult::Done(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DispatchResult::Done(done) => Some(&done.text),
            DispatchResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DispatchResult::Done(_) => None,
            DispatchResult::Failed { error } => Some(error),
        }
    }
}
