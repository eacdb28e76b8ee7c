//! LLM-backed agent over the OpenAI-compatible client.

use super::openai::OpenAiClient;
use async_trait::async_trait;
use relay_application::{Agent, AgentError, AgentOutput, ExecutionHandle};
use relay_domain::{AgentDescriptor, ExecutionEvent, Message, Role};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const STREAM_BUFFER: usize = 32;

/// A configured agent whose executions are chat completions.
///
/// The agent's system prompt (if any) is prepended to every execution;
/// the model falls back to the provider default.
pub struct LlmAgent {
    descriptor: AgentDescriptor,
    client: OpenAiClient,
    system_prompt: Option<String>,
    model: Option<String>,
}

impl LlmAgent {
    pub fn new(descriptor: AgentDescriptor, client: OpenAiClient) -> Self {
        Self {
            descriptor,
            client,
            system_prompt: None,
            model: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn conversation(&self, messages: &[Message]) -> Vec<Message> {
        let Some(system) = &self.system_prompt else {
            return messages.to_vec();
        };
        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(Message::system(system.clone()));
        // Caller-supplied system messages follow the agent's own
        conversation.extend(messages.iter().cloned());
        conversation
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn invoke(&self, messages: &[Message]) -> Result<AgentOutput, AgentError> {
        let request = self
            .client
            .request(&self.conversation(messages), self.model.as_deref());
        let completion = self.client.complete(&request).await?;
        Ok(AgentOutput {
            text: completion.text,
            usage: completion.usage,
        })
    }

    async fn stream(&self, messages: &[Message]) -> Result<ExecutionHandle, AgentError> {
        if !messages.iter().any(|m| m.role == Role::User) {
            return Err(AgentError::ExecutionFailed(
                "no user message to answer".to_string(),
            ));
        }

        let request = self
            .client
            .request(&self.conversation(messages), self.model.as_deref());
        let client = self.client.clone();
        let name = self.descriptor.name.clone();

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let error_tx = tx.clone();
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(agent = %name, "Stream cancelled");
                }
                result = client.stream_into(request, tx) => {
                    if let Err(e) = result {
                        warn!(agent = %name, error = %e, "Stream request failed");
                        let error = AgentError::from(e).to_string();
                        let _ = error_tx.send(ExecutionEvent::Error(error)).await;
                    }
                }
            }
        });

        Ok(ExecutionHandle::new(rx, cancel))
    }
}
