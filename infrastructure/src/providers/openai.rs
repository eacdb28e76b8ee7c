//! OpenAI-compatible chat-completions client.
//!
//! Shared by [`LlmAgent`](super::llm_agent::LlmAgent) and
//! [`LlmClassifier`](super::llm_classifier::LlmClassifier). Works against
//! any server exposing `POST {base_url}/chat/completions`, with or without
//! an API key.

use super::error::ProviderError;
use super::sse::SseDecoder;
use crate::config::FileProviderConfig;
use futures::StreamExt;
use relay_domain::{ExecutionEvent, Message, Usage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Connection settings for one endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Bound on blocking (non-streaming) requests.
    pub request_timeout: Duration,
}

impl OpenAiSettings {
    pub fn from_config(config: &FileProviderConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        }
    }
}

/// OpenAI-compatible API client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    pub fn has_api_key(&self) -> bool {
        self.settings.api_key.is_some()
    }

    /// Shared HTTP client, also used by HTTP agents.
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn request(&self, messages: &[Message], model: Option<&str>) -> ChatRequest {
        ChatRequest {
            model: model.unwrap_or(&self.settings.model).to_string(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens: Some(self.settings.max_tokens),
            temperature: None,
            stream: false,
            stream_options: None,
            response_format: None,
        }
    }

    /// Send a blocking completion and return the first choice.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Completion, ProviderError> {
        let response = self
            .post(request)
            .timeout(self.settings.request_timeout)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: ChatResponse = response.json().await?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            usage: body.usage.map(Usage::from),
        })
    }

    /// Send a streaming completion and forward its events into `tx`.
    ///
    /// Returns once the stream ends, the receiver is dropped, or the
    /// transport fails. Always finishes with a terminal event unless the
    /// receiver is gone.
    pub async fn stream_into(
        &self,
        mut request: ChatRequest,
        tx: mpsc::Sender<ExecutionEvent>,
    ) -> Result<(), ProviderError> {
        request.stream = true;
        request.stream_options = Some(StreamOptions {
            include_usage: true,
        });

        let response = self.post(&request).send().await?;
        let response = Self::check_status(response).await?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut state = StreamState::default();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tx.send(ExecutionEvent::Error(e.to_string())).await;
                    return Ok(());
                }
            };
            for data in decoder.push(&chunk) {
                if !state.forward(&data, &tx).await {
                    return Ok(());
                }
            }
        }
        if let Some(data) = decoder.finish()
            && !state.forward(&data, &tx).await
        {
            return Ok(());
        }

        // Some servers close without `[DONE]`
        debug!("Stream closed without [DONE]");
        let _ = tx.send(state.completed()).await;
        Ok(())
    }

    fn post(&self, request: &ChatRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .json(request);
        match &self.settings.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Result of a blocking completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

#[derive(Default)]
struct StreamState {
    text: String,
    usage: Option<Usage>,
}

impl StreamState {
    /// Forward one SSE payload; `false` once the stream is over.
    async fn forward(&mut self, data: &str, tx: &mpsc::Sender<ExecutionEvent>) -> bool {
        if data.trim() == "[DONE]" {
            let _ = tx.send(self.completed()).await;
            return false;
        }
        let chunk: StreamChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable stream chunk");
                return true;
            }
        };
        if let Some(usage) = chunk.usage.clone() {
            self.usage = Some(Usage::from(usage));
        }
        for event in chunk.into_events() {
            if let ExecutionEvent::Delta(text) = &event {
                self.text.push_str(text);
            }
            if tx.send(event).await.is_err() {
                return false;
            }
        }
        true
    }

    fn completed(&mut self) -> ExecutionEvent {
        ExecutionEvent::Completed {
            text: std::mem::take(&mut self.text),
            usage: self.usage.take(),
        }
    }
}

// ==================== Wire types ====================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<StreamToolCall>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

impl StreamChunk {
    /// Content deltas and tool-call notices carried by this chunk.
    ///
    /// Tool calls stream their arguments in fragments; only the fragment
    /// that names the function is reported.
    fn into_events(self) -> Vec<ExecutionEvent> {
        let mut events = Vec::new();
        for choice in self.choices {
            for call in choice.delta.tool_calls {
                if let Some(StreamFunction {
                    name: Some(name),
                    arguments,
                }) = call.function
                {
                    events.push(ExecutionEvent::ToolInvoked {
                        name,
                        arguments: arguments.filter(|a| !a.is_empty()),
                    });
                }
            }
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                events.push(ExecutionEvent::Delta(content));
            }
        }
        events
    }
}
