//! LLM-backed agent classifier.

use super::openai::OpenAiClient;
use async_trait::async_trait;
use relay_application::{AgentClassifier, ClassifierError};
use relay_domain::{
    AgentDescriptor, Classification, Message, SelectionPromptTemplate, classification_schema,
    parse_classification,
};
use serde_json::json;
use tracing::debug;

/// Asks the provider for `{"agent": <name|null>, "rationale": "..."}`
/// under a `json_schema` response format whose enum is the candidate list.
pub struct LlmClassifier {
    client: OpenAiClient,
    model: Option<String>,
    default_agent: String,
    prefer_specialized: bool,
}

impl LlmClassifier {
    pub fn new(client: OpenAiClient, default_agent: impl Into<String>) -> Self {
        Self {
            client,
            model: None,
            default_agent: default_agent.into(),
            prefer_specialized: true,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_prefer_specialized(mut self, prefer: bool) -> Self {
        self.prefer_specialized = prefer;
        self
    }
}

#[async_trait]
impl AgentClassifier for LlmClassifier {
    async fn classify(
        &self,
        task: &str,
        candidates: &[AgentDescriptor],
    ) -> Result<Classification, ClassifierError> {
        let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
        let messages = [
            Message::system(SelectionPromptTemplate::system(
                candidates,
                &self.default_agent,
                self.prefer_specialized,
            )),
            Message::user(SelectionPromptTemplate::user(task)),
        ];

        let mut request = self.client.request(&messages, self.model.as_deref());
        request.temperature = Some(0.0);
        request.response_format = Some(json!({
            "type": "json_schema",
            "json_schema": {
                "name": "agent_selection",
                "strict": true,
                "schema": classification_schema(&names),
            }
        }));

        let completion = self.client.complete(&request).await?;
        debug!(response = %completion.text, "Classifier response");
        parse_classification(&completion.text, &names)
            .map_err(|e| ClassifierError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openai::OpenAiSettings;
    use crate::providers::test_server;
    use relay_domain::AgentOrigin;
    use std::time::Duration;

    fn classifier(base_url: String) -> LlmClassifier {
        let client = OpenAiClient::new(OpenAiSettings {
            base_url,
            api_key: Some("sk-test".to_string()),
            model: "router-model".to_string(),
            max_tokens: 128,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap();
        LlmClassifier::new(client, "general")
    }

    fn candidates() -> Vec<AgentDescriptor> {
        vec![
            AgentDescriptor::new("general", "General assistant", AgentOrigin::Core).unwrap(),
            AgentDescriptor::new("research", "Papers and articles", AgentOrigin::LazilyLoaded)
                .unwrap(),
        ]
    }

    fn reply(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    #[tokio::test]
    async fn chosen_candidate_with_schema_request() {
        let (url, request) = test_server::serve_capturing(
            200,
            "application/json",
            reply(r#"{"agent": "research", "rationale": "asks for papers"}"#),
        )
        .await;

        let result = classifier(url)
            .classify("find papers on CRDTs", &candidates())
            .await
            .unwrap();
        assert_eq!(
            result,
            Classification::Chosen {
                agent: "research".to_string(),
                rationale: "asks for papers".to_string()
            }
        );

        let sent: serde_json::Value = serde_json::from_str(&request.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "router-model");
        assert_eq!(sent["response_format"]["type"], "json_schema");
        let allowed = &sent["response_format"]["json_schema"]["schema"]["properties"]["agent"]["enum"];
        assert_eq!(allowed, &json!(["general", "research", null]));
    }

    #[tokio::test]
    async fn null_agent_is_declined() {
        let url = test_server::serve_once(
            200,
            "application/json",
            reply(r#"{"agent": null, "rationale": "nothing fits"}"#),
        )
        .await;

        let result = classifier(url).classify("?", &candidates()).await.unwrap();
        assert!(matches!(result, Classification::Declined { .. }));
    }

    #[tokio::test]
    async fn unknown_name_is_malformed() {
        let url = test_server::serve_once(
            200,
            "application/json",
            reply(r#"{"agent": "astrology", "rationale": "stars"}"#),
        )
        .await;

        let err = classifier(url).classify("?", &candidates()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Malformed(_)));
    }
}
