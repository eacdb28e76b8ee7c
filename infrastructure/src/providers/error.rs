//! Error types for the HTTP-backed adapters

use relay_application::{AgentError, ClassifierError};
use thiserror::Error;

/// Errors from the OpenAI-compatible client and HTTP agents
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Timeout => true,
            ProviderError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl From<ProviderError> for AgentError {
    fn from(e: ProviderError) -> Self {
        if e.is_timeout() {
            return AgentError::Timeout;
        }
        match e {
            ProviderError::Http(e) if e.is_connect() => AgentError::Unavailable(e.to_string()),
            ProviderError::Http(e) => AgentError::Transport(e.to_string()),
            other => AgentError::ExecutionFailed(other.to_string()),
        }
    }
}

impl From<ProviderError> for ClassifierError {
    fn from(e: ProviderError) -> Self {
        if e.is_timeout() {
            return ClassifierError::Timeout;
        }
        match e {
            ProviderError::InvalidResponse(msg) => ClassifierError::Malformed(msg),
            other => ClassifierError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_to_execution_failure() {
        let err = ProviderError::Api {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(
            AgentError::from(err),
            AgentError::ExecutionFailed("API error (status 429): rate limited".to_string())
        );
    }

    #[test]
    fn timeout_maps_through() {
        assert_eq!(AgentError::from(ProviderError::Timeout), AgentError::Timeout);
        assert_eq!(
            ClassifierError::from(ProviderError::Timeout),
            ClassifierError::Timeout
        );
    }

    #[test]
    fn invalid_response_is_malformed_classification() {
        assert!(matches!(
            ClassifierError::from(ProviderError::InvalidResponse("no choices".to_string())),
            ClassifierError::Malformed(_)
        ));
    }
}
