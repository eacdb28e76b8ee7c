//! Classifier port
//!
//! Narrow strategy interface behind agent selection: (task, candidates) to
//! one candidate name or an explicit decline.

use async_trait::async_trait;
use relay_domain::{AgentDescriptor, Classification};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Classification timed out")]
    Timeout,

    #[error("Malformed classification: {0}")]
    Malformed(String),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AgentClassifier: Send + Sync {
    /// Pick one of `candidates` for `task`, or decline.
    async fn classify(
        &self,
        task: &str,
        candidates: &[AgentDescriptor],
    ) -> Result<Classification, ClassifierError>;
}
