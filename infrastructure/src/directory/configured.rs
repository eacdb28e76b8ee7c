//! Directory of external agents declared in `[[directories]]`.

use crate::config::FileDirectoryConfig;
use crate::providers::HttpAgent;
use async_trait::async_trait;
use relay_application::{Agent, AgentDirectory, DirectoryEntry, DirectoryError};
use relay_domain::{AgentDescriptor, Identity};
use reqwest::Client;
use std::sync::Arc;
use tracing::warn;

struct Listed {
    descriptor: AgentDescriptor,
    endpoint: String,
    reachable: bool,
}

/// Static listing of tools and peers visible to one identity.
pub struct ConfiguredDirectory {
    id: String,
    identity: Identity,
    agents: Vec<Listed>,
    client: Client,
}

impl ConfiguredDirectory {
    /// Build from config; entries with invalid descriptors are skipped.
    pub fn from_config(config: &FileDirectoryConfig, client: Client) -> Self {
        let agents = config
            .agents
            .iter()
            .filter_map(|entry| match entry.to_descriptor() {
                Ok(descriptor) => Some(Listed {
                    descriptor,
                    endpoint: entry.endpoint.trim().to_string(),
                    reachable: entry.reachable,
                }),
                Err(e) => {
                    warn!(directory = %config.id, agent = %entry.name, error = %e, "Skipping directory entry");
                    None
                }
            })
            .collect();

        Self {
            id: config.id.clone(),
            identity: Identity::new(config.identity.trim()),
            agents,
            client,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[async_trait]
impl AgentDirectory for ConfiguredDirectory {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list(&self, identity: &Identity) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        if identity != &self.identity {
            return Ok(Vec::new());
        }
        Ok(self
            .agents
            .iter()
            .map(|a| DirectoryEntry::new(a.descriptor.clone(), a.reachable))
            .collect())
    }

    async fn connect(
        &self,
        identity: &Identity,
        descriptor: &AgentDescriptor,
    ) -> Result<Arc<dyn Agent>, DirectoryError> {
        let listed = self
            .agents
            .iter()
            .find(|a| a.descriptor.name == descriptor.name)
            .filter(|_| identity == &self.identity)
            .ok_or_else(|| DirectoryError::Connect {
                name: descriptor.name.clone(),
                message: format!("not listed for identity '{}'", identity),
            })?;

        if listed.endpoint.is_empty() {
            return Err(DirectoryError::Connect {
                name: descriptor.name.clone(),
                message: "no endpoint configured".to_string(),
            });
        }

        let agent = HttpAgent::new(
            listed.descriptor.clone(),
            self.client.clone(),
            listed.endpoint.clone(),
        )
        .for_identity(identity.clone());
        Ok(Arc::new(agent))
    }
}
