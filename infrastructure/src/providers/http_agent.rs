//! External agents reached over plain HTTP.
//!
//! Request: `POST {endpoint}` with
//! `{"agent": "<name>", "identity": "<caller>", "messages": [{"role", "content"}]}`.
//! Response: `{"text": "...", "usage": {...}}` where `usage` is optional.

use super::error::ProviderError;
use super::openai::ChatMessage;
use async_trait::async_trait;
use relay_application::{Agent, AgentError, AgentOutput};
use relay_domain::{AgentDescriptor, Identity, Message, Usage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct HttpAgentRequest<'a> {
    agent: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<&'a str>,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct HttpAgentReply {
    text: String,
    #[serde(default)]
    usage: Option<Usage>,
}

/// Non-streaming agent backed by a JSON endpoint.
pub struct HttpAgent {
    descriptor: AgentDescriptor,
    client: Client,
    endpoint: String,
    identity: Option<Identity>,
    timeout: Duration,
}

impl HttpAgent {
    pub fn new(descriptor: AgentDescriptor, client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            descriptor,
            client,
            endpoint: endpoint.into(),
            identity: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Caller on whose behalf the agent is invoked.
    pub fn for_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, messages: &[Message]) -> Result<HttpAgentReply, ProviderError> {
        let request = HttpAgentRequest {
            agent: &self.descriptor.name,
            identity: self.identity.as_ref().map(Identity::as_str),
            messages: messages.iter().map(ChatMessage::from).collect(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("expected {{\"text\": ...}}: {}", e))
        })
    }
}

#[async_trait]
impl Agent for HttpAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, messages: &[Message]) -> Result<AgentOutput, AgentError> {
        let reply = self.call(messages).await?;
        Ok(AgentOutput {
            text: reply.text,
            usage: reply.usage,
        })
    }
}
