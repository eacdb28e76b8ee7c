//! Dispatch use case.
//!
//! Runs the selected agent and translates its incremental output into the
//! caller-facing [`StreamEvent`] protocol:
//!
//! ```text
//! executing ─┬─ content-delta / tool-invoked / tool-result ─┐
//!            │                                              │ (repeat)
//!            ├─ synthesis-complete → done                   │
//!            └─ failed                                      │
//! ```
//!
//! A single spawned forwarding loop owns emission, so events for one
//! dispatch are strictly ordered. Exactly one terminal event is emitted
//! unless the caller cancels, after which nothing is emitted at all.

use crate::config::DispatchParams;
use crate::ports::agent::{Agent, AgentError, AgentOutput};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use relay_domain::core::string::{squash_whitespace, truncate};
use relay_domain::{
    DispatchResult, DoneEvent, DoneMetadata, EventSequence, ExecutionEvent, Message, Selection,
    StreamEvent,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything needed to run one dispatch.
pub struct DispatchInput {
    /// Final message list (prompt already augmented).
    pub messages: Vec<Message>,
    pub selection: Selection,
    pub agent: Arc<dyn Agent>,
}

/// Caller side of a running dispatch.
///
/// Dropping the stream cancels the dispatch.
pub struct DispatchStream {
    receiver: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DispatchStream {
    /// A stream holding a single `failed` event.
    pub fn failed(error: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(StreamEvent::failed(error));
        Self {
            receiver: rx,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Next event, or `None` once the stream ended or was cancelled.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.receiver.recv() => event,
        }
    }

    /// Stop forwarding. No event is delivered after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drain to the terminal event.
    pub async fn into_result(mut self) -> DispatchResult {
        while let Some(event) = self.next().await {
            if let Some(result) = event.into_result() {
                return result;
            }
        }
        DispatchResult::Failed {
            error: "dispatch ended without a result".to_string(),
        }
    }

    /// Drain every event, terminal included.
    pub async fn collect(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }
}

impl Drop for DispatchStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && !task.is_finished()
        {
            debug!("Dispatch stream dropped while running");
        }
    }
}

/// Sends events through the ordering guard, stopping on cancellation.
struct Emitter {
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    sequence: EventSequence,
}

impl Emitter {
    /// Returns `false` once nothing more may be emitted.
    async fn emit(&mut self, event: StreamEvent) -> bool {
        if self.cancel.is_cancelled() || !self.sequence.admit(&event) {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(event) => sent.is_ok(),
        }
    }
}

/// Executes agents under the streaming protocol.
#[derive(Clone)]
pub struct Dispatcher {
    params: DispatchParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Dispatcher {
    pub fn new(params: DispatchParams) -> Self {
        Self {
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Start a dispatch and return its event stream.
    pub fn start(&self, input: DispatchInput) -> DispatchStream {
        let (tx, rx) = mpsc::channel(self.params.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let emitter = Emitter {
            tx,
            cancel: cancel.clone(),
            sequence: EventSequence::new(),
        };

        let this = self.clone();
        let task = tokio::spawn(async move { this.run(input, emitter).await });

        DispatchStream {
            receiver: rx,
            cancel,
            task: Some(task),
        }
    }

    /// Synchronous surface: run to the terminal result.
    pub async fn execute(&self, input: DispatchInput) -> DispatchResult {
        self.start(input).into_result().await
    }

    async fn run(self, input: DispatchInput, mut emitter: Emitter) {
        let DispatchInput {
            messages,
            selection,
            agent,
        } = input;
        let started = Instant::now();
        let cancel = emitter.cancel.clone();

        info!(agent = %selection.agent, streaming = agent.supports_streaming(), "Dispatch started");

        let deadline = self.params.execution_timeout;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            _ = async {
                match deadline {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            } => Err(AgentError::Timeout),
            result = self.execute_agent(agent.as_ref(), &messages, &mut emitter) => result,
        };

        if cancel.is_cancelled() {
            debug!(agent = %selection.agent, "Dispatch cancelled; emitting nothing further");
            return;
        }

        match outcome {
            Ok(output) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let usage = output.usage.map(|u| u.normalized()).unwrap_or_default();
                let done = DoneEvent {
                    text: output.text,
                    agent: selection.agent.clone(),
                    rationale: selection.rationale.clone(),
                    candidates: selection.candidates.clone(),
                    metadata: DoneMetadata {
                        elapsed_ms: Some(elapsed_ms),
                        usage,
                    },
                };

                self.conversation_logger.log(ConversationEvent::new(
                    "dispatch_done",
                    serde_json::json!({
                        "agent": done.agent,
                        "elapsed_ms": elapsed_ms,
                        "bytes": done.text.len(),
                    }),
                ));
                info!(agent = %done.agent, elapsed_ms, "Dispatch completed");

                if emitter.emit(StreamEvent::SynthesisComplete).await {
                    emitter.emit(StreamEvent::Done(done)).await;
                }
            }
            Err(AgentError::Cancelled) => {
                debug!(agent = %selection.agent, "Dispatch stopped: receiver gone");
            }
            Err(e) => {
                warn!(agent = %selection.agent, error = %e, "Dispatch failed");
                self.conversation_logger.log(ConversationEvent::new(
                    "dispatch_failed",
                    serde_json::json!({
                        "agent": selection.agent,
                        "error": e.to_string(),
                    }),
                ));
                emitter.emit(StreamEvent::failed(e.to_string())).await;
            }
        }
    }

    async fn execute_agent(
        &self,
        agent: &dyn Agent,
        messages: &[Message],
        emitter: &mut Emitter,
    ) -> Result<AgentOutput, AgentError> {
        if !agent.supports_streaming() {
            return agent.invoke(messages).await;
        }

        let mut handle = agent.stream(messages).await?;
        let mut accumulated = String::new();

        while let Some(event) = handle.next().await {
            let translated = match event {
                ExecutionEvent::Delta(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    accumulated.push_str(&text);
                    StreamEvent::ContentDelta { text }
                }
                ExecutionEvent::ToolInvoked { name, arguments } => {
                    debug!(tool = %name, args = ?arguments.as_deref().map(|a| truncate(a, 200)), "Tool invoked");
                    StreamEvent::ToolInvoked { tool: name }
                }
                ExecutionEvent::ToolResult { name, output } => StreamEvent::ToolResult {
                    summary: self.summarize(&output),
                    tool: name,
                },
                ExecutionEvent::Completed { text, usage } => {
                    let text = if accumulated.is_empty() { text } else { accumulated };
                    return Ok(AgentOutput { text, usage });
                }
                ExecutionEvent::Error(e) => return Err(AgentError::ExecutionFailed(e)),
            };

            if !emitter.emit(translated).await {
                return Err(AgentError::Cancelled);
            }
        }

        Err(AgentError::ExecutionFailed(
            "execution stream ended without completion".to_string(),
        ))
    }

    fn summarize(&self, output: &str) -> String {
        truncate(&squash_whitespace(output), self.params.tool_summary_bytes)
    }
}
