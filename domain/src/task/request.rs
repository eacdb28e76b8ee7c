//! Task requests entering the dispatch pipeline.

use crate::core::error::DomainError;
use crate::job::JobId;
use crate::session::entities::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller identity. External agent overlays are scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Present when a task is one fire of a recurring job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceContext {
    pub job_id: JobId,
    /// Completed runs before this fire.
    pub run_count: u32,
}

/// A natural-language request. Immutable once dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub content: String,
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub prior_turns: Vec<Message>,
    /// Agents the caller asked for, most preferred first.
    #[serde(default)]
    pub preferred_agents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceContext>,
}

impl TaskRequest {
    pub fn new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidTask("task content is empty".to_string()));
        }
        Ok(Self {
            content,
            conversation_id: String::new(),
            identity: None,
            prior_turns: Vec::new(),
            preferred_agents: Vec::new(),
            recurrence: None,
        })
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_prior_turns(mut self, turns: Vec<Message>) -> Self {
        self.prior_turns = turns;
        self
    }

    pub fn with_preferred_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recurrence(mut self, context: RecurrenceContext) -> Self {
        self.recurrence = Some(context);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Build the message list for execution: prior turns, then `prompt` as
    /// the final user message.
    pub fn messages_with_prompt(&self, prompt: &str) -> Vec<Message> {
        let mut messages = self.prior_turns.clone();
        messages.push(Message::user(prompt));
        messages
    }
}
