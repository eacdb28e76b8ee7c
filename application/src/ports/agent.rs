//! Agent port
//!
//! One polymorphic capability interface for every agent origin (core, lazily
//! loaded, external tool, external peer). Adapters live in the
//! infrastructure layer; origin is carried by the descriptor, not the type.

use async_trait::async_trait;
use relay_domain::{AgentDescriptor, ExecutionEvent, Message, Usage};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors an agent execution can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Execution timed out")]
    Timeout,

    #[error("Execution cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Final output of a blocking invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentOutput {
    pub text: String,
    pub usage: Option<Usage>,
}

impl AgentOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Handle for receiving incremental events from one agent execution.
///
/// Wraps an `mpsc::Receiver<ExecutionEvent>` plus the token that stops the
/// producer. Dropping the handle cancels the execution.
pub struct ExecutionHandle {
    receiver: mpsc::Receiver<ExecutionEvent>,
    cancel: CancellationToken,
}

impl ExecutionHandle {
    pub fn new(receiver: mpsc::Receiver<ExecutionEvent>, cancel: CancellationToken) -> Self {
        Self { receiver, cancel }
    }

    /// A handle that yields a single `Completed` event.
    pub fn from_output(output: AgentOutput) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: this cannot fail
        let _ = tx.try_send(ExecutionEvent::Completed {
            text: output.text,
            usage: output.usage,
        });
        Self::new(rx, CancellationToken::new())
    }

    pub async fn next(&mut self) -> Option<ExecutionEvent> {
        self.receiver.recv().await
    }

    /// Token the producer watches; cancel it to stop the execution.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Consume the stream and collect the final output.
    ///
    /// Accumulated deltas win over the `Completed` text when both exist.
    pub async fn collect_text(mut self) -> Result<AgentOutput, AgentError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                ExecutionEvent::Delta(chunk) => full_text.push_str(&chunk),
                ExecutionEvent::Completed { text, usage } => {
                    let text = if full_text.is_empty() { text } else { full_text };
                    return Ok(AgentOutput { text, usage });
                }
                ExecutionEvent::Error(e) => return Err(AgentError::ExecutionFailed(e)),
                ExecutionEvent::ToolInvoked { .. } | ExecutionEvent::ToolResult { .. } => {}
            }
        }
        Err(AgentError::ExecutionFailed(
            "execution stream closed before completion".to_string(),
        ))
    }
}

impl Drop for ExecutionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// An executable agent.
#[async_trait]
pub trait Agent: Send + Sync {
    fn descriptor(&self) -> &AgentDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Whether [`stream`](Self::stream) yields incremental events.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Run the agent to completion.
    async fn invoke(&self, messages: &[Message]) -> Result<AgentOutput, AgentError>;

    /// Run the agent with incremental output.
    ///
    /// Default implementation calls `invoke()` and wraps the result in a
    /// single `Completed` event.
    async fn stream(&self, messages: &[Message]) -> Result<ExecutionHandle, AgentError> {
        let output = self.invoke(messages).await?;
        Ok(ExecutionHandle::from_output(output))
    }
}
