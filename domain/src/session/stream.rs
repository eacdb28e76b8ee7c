//! Incremental output of the execution substrate.
//!
//! [`ExecutionEvent`] is what an agent's streaming execution yields. The
//! dispatcher translates each one into exactly one caller-facing
//! [`StreamEvent`](crate::dispatch::event::StreamEvent).

use super::usage::Usage;

/// One incremental unit of an agent's streaming execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// A text chunk from the agent.
    Delta(String),
    /// The agent invoked a tool.
    ToolInvoked {
        name: String,
        arguments: Option<String>,
    },
    /// A tool returned. `output` is the raw payload and may be large.
    ToolResult { name: String, output: String },
    /// The execution finished (signals stream end).
    Completed { text: String, usage: Option<Usage> },
    /// The execution failed (signals stream end).
    Error(String),
}

impl ExecutionEvent {
    pub fn completed(text: impl Into<String>) -> Self {
        ExecutionEvent::Completed {
            text: text.into(),
            usage: None,
        }
    }

    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            ExecutionEvent::Delta(s) => Some(s),
            ExecutionEvent::Completed { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionEvent::Completed { .. } | ExecutionEvent::Error(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_text_returns_content() {
        let event = ExecutionEvent::Delta("hello".to_string());
        assert_eq!(event.text(), Some("hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn completed_is_terminal() {
        let event = ExecutionEvent::completed("full response");
        assert_eq!(event.text(), Some("full response"));
        assert!(event.is_terminal());
    }

    #[test]
    fn error_has_no_text_and_is_terminal() {
        let event = ExecutionEvent::Error("oops".to_string());
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }

    #[test]
    fn tool_events_are_not_terminal() {
        let invoked = ExecutionEvent::ToolInvoked {
            name: "brave_search".to_string(),
            arguments: Some("{\"q\":\"rust\"}".to_string()),
        };
        let result = ExecutionEvent::ToolResult {
            name: "brave_search".to_string(),
            output: "...".to_string(),
        };
        assert!(!invoked.is_terminal());
        assert!(!result.is_terminal());
    }
}
