//! External agent directory port
//!
//! Per-identity sources of external tool providers and peer agents. The
//! catalog caches their listings per identity and connects lazily.

use crate::ports::agent::Agent;
use async_trait::async_trait;
use relay_domain::{AgentDescriptor, Identity};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot connect to '{name}': {message}")]
    Connect { name: String, message: String },
}

/// One listed external agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub descriptor: AgentDescriptor,
    /// Whether the provider reports the agent reachable right now.
    pub reachable: bool,
}

impl DirectoryEntry {
    pub fn new(descriptor: AgentDescriptor, reachable: bool) -> Self {
        Self {
            descriptor,
            reachable,
        }
    }
}

#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Stable identifier for logging.
    fn id(&self) -> &str;

    /// External agents visible to `identity`.
    async fn list(&self, identity: &Identity) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Build an executable agent for a listed descriptor.
    async fn connect(
        &self,
        identity: &Identity,
        descriptor: &AgentDescriptor,
    ) -> Result<Arc<dyn Agent>, DirectoryError>;
}
