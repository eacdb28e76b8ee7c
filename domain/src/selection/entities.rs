//! Selection outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the selector ended up on the default agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum FallbackReason {
    /// Classification call timed out, errored or returned garbage.
    ClassifierFailed(String),
    /// Classifier explicitly declined to pick a candidate.
    ClassifierDeclined,
    /// Classifier named something outside the candidate set.
    UnknownAgent(String),
    /// No candidates besides the default agent.
    NoCandidates,
    /// The selected agent could not be resolved from the catalog.
    Unresolvable(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ClassifierFailed(detail) => write!(f, "classifier failed ({})", detail),
            FallbackReason::ClassifierDeclined => f.write_str("classifier declined to choose"),
            FallbackReason::UnknownAgent(name) => {
                write!(f, "classifier chose unknown agent '{}'", name)
            }
            FallbackReason::NoCandidates => f.write_str("no specialized candidates available"),
            FallbackReason::Unresolvable(name) => write!(f, "agent '{}' could not be resolved", name),
        }
    }
}

/// How the agent was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionSource {
    /// `/command` prefix addressed the agent directly.
    Command,
    /// First available entry of the caller's preference list.
    Preference,
    Classifier,
    Fallback(FallbackReason),
}

/// The selector's answer: exactly one agent plus a justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub agent: String,
    pub rationale: String,
    /// Every candidate name that was considered, in catalog order.
    pub candidates: Vec<String>,
    pub source: SelectionSource,
    /// Task content to execute when it differs from the request
    /// (slash command stripped).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewritten_task: Option<String>,
}

impl Selection {
    pub fn new(
        agent: impl Into<String>,
        rationale: impl Into<String>,
        candidates: Vec<String>,
        source: SelectionSource,
    ) -> Self {
        Self {
            agent: agent.into(),
            rationale: rationale.into(),
            candidates,
            source,
            rewritten_task: None,
        }
    }

    /// Selection of `default_agent` annotated with the fallback reason.
    pub fn fallback(default_agent: &str, reason: FallbackReason, candidates: Vec<String>) -> Self {
        let rationale = format!("fallback to default agent '{}': {}", default_agent, reason);
        Self::new(
            default_agent,
            rationale,
            candidates,
            SelectionSource::Fallback(reason),
        )
    }

    pub fn with_rewritten_task(mut self, task: impl Into<String>) -> Self {
        self.rewritten_task = Some(task.into());
        self
    }

    /// Prefix the rationale with an extra note.
    pub fn with_note(mut self, note: &str) -> Self {
        self.rationale = format!("{}; {}", note, self.rationale);
        self
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, SelectionSource::Fallback(_))
    }

    /// Content to send to the agent.
    pub fn task_content<'a>(&'a self, original: &'a str) -> &'a str {
        self.rewritten_task.as_deref().unwrap_or(original)
    }
}

/// Result of a classification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Chosen { agent: String, rationale: String },
    Declined { rationale: String },
}
