//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Agent name must not be empty")]
    EmptyAgentName,

    #[error("Agent '{0}' has no description; it cannot take part in selection")]
    MissingDescription(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
