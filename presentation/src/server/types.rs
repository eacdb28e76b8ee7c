//! Request and response bodies for the HTTP surface.

use chrono::{DateTime, Utc};
use relay_application::{FireOutcome, SkipReason};
use relay_domain::{AgentDescriptor, Deactivation, DomainError, Identity, Message, TaskRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub prior_turns: Vec<Message>,
    #[serde(default)]
    pub preferred_agents: Vec<String>,
}

impl ChatRequest {
    pub fn into_task(self) -> Result<TaskRequest, DomainError> {
        let mut task = TaskRequest::new(self.content)?
            .with_prior_turns(self.prior_turns)
            .with_preferred_agents(self.preferred_agents);
        if let Some(conversation_id) = self.conversation_id {
            task = task.with_conversation(conversation_id);
        }
        if let Some(identity) = self.identity.filter(|i| !i.trim().is_empty()) {
            task = task.with_identity(Identity::new(identity.trim()));
        }
        Ok(task)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentsQuery {
    #[serde(default)]
    pub identity: Option<String>,
}

impl AgentsQuery {
    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(Identity::new)
    }
}

#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentDescriptor>,
}

/// Result of `POST /api/jobs/{id}/fire`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FireResponse {
    Delivered {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        from_batch: bool,
        run_count: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_fire: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        deactivated: Option<&'static str>,
    },
    Skipped {
        reason: &'static str,
    },
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_at: Option<DateTime<Utc>>,
    },
}

pub fn skip_reason_str(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Locked => "locked",
        SkipReason::NotFound => "not-found",
        SkipReason::Inactive => "inactive",
        SkipReason::NotDue => "not-due",
    }
}

pub fn deactivation_str(deactivation: Deactivation) -> &'static str {
    match deactivation {
        Deactivation::OneShot => "one-shot",
        Deactivation::MaxRunsReached => "max-runs-reached",
    }
}

impl From<FireOutcome> for FireResponse {
    fn from(outcome: FireOutcome) -> Self {
        match outcome {
            FireOutcome::Delivered(delivery) => FireResponse::Delivered {
                text: delivery.text,
                agent: delivery.agent,
                from_batch: delivery.from_batch,
                run_count: delivery.run_count,
                next_fire: delivery.next_fire,
                deactivated: delivery.deactivated.map(deactivation_str),
            },
            FireOutcome::Skipped(reason) => FireResponse::Skipped {
                reason: skip_reason_str(reason),
            },
            FireOutcome::Failed { error, retry_at } => FireResponse::Failed { error, retry_at },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
