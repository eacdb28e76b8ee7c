//! Builds runtime collaborators from a loaded [`FileConfig`].

use crate::classifier::KeywordClassifier;
use crate::config::{AgentKind, ClassifierKind, FileAgentEntry, FileConfig};
use crate::directory::ConfiguredDirectory;
use crate::logging::JsonlConversationLogger;
use crate::providers::{HttpAgent, LlmAgent, LlmClassifier, OpenAiClient};
use chrono::{DateTime, Utc};
use relay_application::{
    Agent, AgentCatalog, AgentClassifier, AgentError, ConversationLogger, JobStore,
    NoConversationLogger, StoreError, agent_factory,
};
use relay_domain::AgentDescriptor;
use std::sync::Arc;
use tracing::{info, warn};

/// Construct the executable agent for one `[[agents]]` entry.
pub fn build_agent(
    entry: &FileAgentEntry,
    descriptor: AgentDescriptor,
    client: &OpenAiClient,
) -> Result<Arc<dyn Agent>, AgentError> {
    match entry.parse_kind().0 {
        AgentKind::Llm => {
            let mut agent = LlmAgent::new(descriptor, client.clone());
            if let Some(prompt) = &entry.system_prompt {
                agent = agent.with_system_prompt(prompt.clone());
            }
            if let Some(model) = &entry.model {
                agent = agent.with_model(model.clone());
            }
            Ok(Arc::new(agent))
        }
        AgentKind::Http => {
            let endpoint = entry
                .endpoint
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .ok_or_else(|| {
                    AgentError::Unavailable(format!("agent '{}' has no endpoint", entry.name))
                })?;
            Ok(Arc::new(HttpAgent::new(
                descriptor,
                client.http().clone(),
                endpoint,
            )))
        }
    }
}

/// Register every configured agent and directory.
///
/// Core agents are built now; lazy agents get a factory that builds them on
/// first resolution. Entries that fail to build are skipped with a warning.
pub fn build_catalog(config: &FileConfig, client: &OpenAiClient) -> AgentCatalog {
    let mut catalog = AgentCatalog::new(config.catalog.to_params());

    for directory in &config.directories {
        let directory = ConfiguredDirectory::from_config(directory, client.http().clone());
        info!(directory = %relay_application::AgentDirectory::id(&directory), agents = directory.len(), "Registered agent directory");
        catalog = catalog.with_directory(Arc::new(directory));
    }

    for entry in &config.agents {
        let descriptor = match entry.to_descriptor() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(agent = %entry.name, error = %e, "Skipping agent entry");
                continue;
            }
        };

        if entry.lazy {
            let entry = entry.clone();
            let client = client.clone();
            let factory_descriptor = descriptor.clone();
            catalog.register(
                descriptor,
                agent_factory(move || {
                    let result = build_agent(&entry, factory_descriptor.clone(), &client);
                    async move { result }
                }),
            );
            continue;
        }

        match build_agent(entry, descriptor, client) {
            Ok(agent) => catalog.register_instance(agent),
            Err(e) => warn!(agent = %entry.name, error = %e, "Skipping agent entry"),
        }
    }

    catalog
}

/// The classifier selected by `[selection].classifier`.
///
/// The LLM classifier needs an API key when pointed at the hosted OpenAI
/// endpoint; without one the keyword classifier is used instead.
pub fn build_classifier(config: &FileConfig, client: &OpenAiClient) -> Arc<dyn AgentClassifier> {
    let default_agent = config.selection.default_agent.trim().to_string();
    let keyword = || Arc::new(KeywordClassifier::new(default_agent.clone())) as Arc<dyn AgentClassifier>;

    match config.selection.parse_classifier().0 {
        ClassifierKind::Keyword => keyword(),
        ClassifierKind::Llm
            if !client.has_api_key() && client.settings().base_url.contains("api.openai.com") =>
        {
            warn!(
                env = %config.provider.api_key_env,
                "No provider API key; falling back to the keyword classifier"
            );
            keyword()
        }
        ClassifierKind::Llm => Arc::new(
            LlmClassifier::new(client.clone(), default_agent.clone())
                .with_prefer_specialized(config.selection.prefer_specialized),
        ),
    }
}

/// Transcript logger from `[logging]`, or the no-op logger.
pub fn build_conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let Some(path) = config.logging.conversation_log_path() else {
        return Arc::new(NoConversationLogger);
    };
    match JsonlConversationLogger::open(&path) {
        Some(logger) => {
            info!(path = %path.display(), "Writing conversation transcript");
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}

/// Store every valid `[[jobs]]` entry not already present.
///
/// Returns how many jobs were added. Existing jobs keep their schedule so
/// run counts survive a reload.
pub async fn seed_jobs(
    config: &FileConfig,
    store: &dyn JobStore,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let mut added = 0;
    for entry in &config.jobs {
        let job = match entry.to_job(now) {
            Ok(job) => job,
            Err(issue) => {
                warn!(job = %entry.id, "{}", issue.message);
                continue;
            }
        };
        if store.get_job(&job.id).await?.is_some() {
            continue;
        }
        info!(job_id = %job.id, kind = %job.schedule.kind, "Seeded recurring job");
        store.put_job(job).await?;
        added += 1;
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileDirectoryConfig, FileExternalAgent, FileJobConfig};
    use crate::providers::OpenAiSettings;
    use crate::store::InMemoryStore;
    use relay_domain::{AgentOrigin, Identity};
    use std::time::Duration;

    fn client(api_key: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(OpenAiSettings {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: api_key.map(str::to_string),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 64,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn config() -> FileConfig {
        let mut config = FileConfig::default();
        config.agents.push(FileAgentEntry {
            name: "research".to_string(),
            description: "Papers".to_string(),
            lazy: true,
            ..Default::default()
        });
        config.agents.push(FileAgentEntry {
            name: "remote".to_string(),
            description: "No endpoint".to_string(),
            kind: "http".to_string(),
            ..Default::default()
        });
        config.directories.push(FileDirectoryConfig {
            id: "alice-tools".to_string(),
            identity: "alice".to_string(),
            agents: vec![FileExternalAgent {
                name: "weather".to_string(),
                description: "Forecasts".to_string(),
                endpoint: "http://localhost:9100".to_string(),
                ..Default::default()
            }],
        });
        config
    }

    #[tokio::test]
    async fn catalog_registers_core_lazy_and_external() {
        let catalog = build_catalog(&config(), &client(Some("sk")));

        assert!(catalog.is_loaded("general"));
        assert!(catalog.contains("research"));
        assert!(!catalog.is_loaded("research"));
        // Core http agent without endpoint is skipped
        assert!(!catalog.contains("remote"));

        let research = catalog.resolve("research").await.unwrap();
        assert_eq!(research.descriptor().origin, AgentOrigin::LazilyLoaded);
        assert!(catalog.is_loaded("research"));

        let names: Vec<String> = catalog
            .available_for(Some(&Identity::new("alice")))
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert!(names.contains(&"weather".to_string()));
    }

    #[test]
    fn missing_key_falls_back_to_keyword_classifier() {
        // Only observable through the type; both must build without panicking
        let _ = build_classifier(&FileConfig::default(), &client(None));
        let _ = build_classifier(&FileConfig::default(), &client(Some("sk")));
    }

    #[tokio::test]
    async fn seeding_skips_existing_and_invalid_jobs() {
        let mut config = FileConfig::default();
        config.jobs.push(FileJobConfig {
            id: "joke".to_string(),
            owner: "alice".to_string(),
            prompt: "Tell me a joke".to_string(),
            ..Default::default()
        });
        config.jobs.push(FileJobConfig {
            id: "bad".to_string(),
            prompt: "x".to_string(),
            kind: "custom".to_string(),
            ..Default::default()
        });

        let store = InMemoryStore::new();
        let now = Utc::now();
        assert_eq!(seed_jobs(&config, &store, now).await.unwrap(), 1);
        assert_eq!(seed_jobs(&config, &store, now).await.unwrap(), 0);
        assert_eq!(store.list_jobs().await.unwrap().len(), 1);
    }
}
