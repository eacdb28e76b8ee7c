//! Select Agent use case.
//!
//! Picks exactly one agent for a task, in order:
//!
//! 1. `/command` prefix naming a candidate
//! 2. first available entry of the caller's preference list
//! 3. classifier choice among the candidates (with a deadline)
//! 4. the default agent, with the reason in the rationale
//!
//! Selection never fails; every degraded path lands on the default agent.

use crate::catalog::AgentCatalog;
use crate::config::SelectionParams;
use crate::ports::classifier::AgentClassifier;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use relay_domain::util::truncate_str;
use relay_domain::{
    AgentDescriptor, Classification, FallbackReason, Selection, SelectionSource, TaskRequest,
    parse_command,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AgentSelector {
    catalog: Arc<AgentCatalog>,
    classifier: Arc<dyn AgentClassifier>,
    params: SelectionParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl AgentSelector {
    pub fn new(
        catalog: Arc<AgentCatalog>,
        classifier: Arc<dyn AgentClassifier>,
        params: SelectionParams,
    ) -> Self {
        Self {
            catalog,
            classifier,
            params,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn default_agent(&self) -> &str {
        &self.params.default_agent
    }

    /// Select against the caller's available agents.
    pub async fn select(&self, task: &TaskRequest) -> Selection {
        let candidates = self.catalog.available_for(task.identity.as_ref()).await;
        let selection = self.select_from(task, &candidates).await;

        self.conversation_logger.log(ConversationEvent::new(
            "selection",
            serde_json::json!({
                "conversation_id": task.conversation_id,
                "agent": selection.agent,
                "rationale": selection.rationale,
                "candidates": selection.candidates,
                "fallback": selection.is_fallback(),
            }),
        ));
        selection
    }

    /// Select among an explicit candidate snapshot.
    pub async fn select_from(&self, task: &TaskRequest, candidates: &[AgentDescriptor]) -> Selection {
        let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();

        if let Some(selection) = self.by_command(task, candidates, &names) {
            info!(agent = %selection.agent, "Agent addressed by command");
            return selection;
        }

        let mut note = None;
        if !task.preferred_agents.is_empty() {
            if let Some(preferred) = task
                .preferred_agents
                .iter()
                .find(|p| names.iter().any(|n| n == *p))
            {
                info!(agent = %preferred, "Agent selected from caller preference");
                return Selection::new(
                    preferred.clone(),
                    "explicitly requested by the caller",
                    names,
                    SelectionSource::Preference,
                );
            }
            debug!(preferred = ?task.preferred_agents, "No preferred agent is available");
            note = Some(format!(
                "preferred agents unavailable ({})",
                task.preferred_agents.join(", ")
            ));
        }

        let selection = self.classify(task, candidates, names).await;
        match note {
            Some(note) => selection.with_note(&note),
            None => selection,
        }
    }

    fn by_command(
        &self,
        task: &TaskRequest,
        candidates: &[AgentDescriptor],
        names: &[String],
    ) -> Option<Selection> {
        let (command, rest) = parse_command(&task.content)?;
        let target = candidates
            .iter()
            .find(|c| c.command.as_deref() == Some(command))
            .or_else(|| candidates.iter().find(|c| c.name == command))?;

        let selection = Selection::new(
            target.name.clone(),
            format!("addressed directly by /{}", command),
            names.to_vec(),
            SelectionSource::Command,
        );
        Some(if rest.is_empty() {
            selection
        } else {
            selection.with_rewritten_task(rest)
        })
    }

    async fn classify(
        &self,
        task: &TaskRequest,
        candidates: &[AgentDescriptor],
        names: Vec<String>,
    ) -> Selection {
        let default_agent = self.params.default_agent.as_str();

        if !names.iter().any(|n| n != default_agent) {
            return self.fallback(FallbackReason::NoCandidates, names);
        }

        let outcome = tokio::time::timeout(
            self.params.classifier_timeout,
            self.classifier.classify(&task.content, candidates),
        )
        .await;

        match outcome {
            Ok(Ok(Classification::Chosen { agent, rationale })) => {
                if names.iter().any(|n| *n == agent) {
                    info!(agent = %agent, "Agent selected by classifier");
                    Selection::new(agent, rationale, names, SelectionSource::Classifier)
                } else {
                    self.fallback(FallbackReason::UnknownAgent(agent), names)
                }
            }
            Ok(Ok(Classification::Declined { rationale })) => {
                debug!(rationale = %truncate_str(&rationale, 200), "Classifier declined");
                self.fallback(FallbackReason::ClassifierDeclined, names)
            }
            Ok(Err(e)) => self.fallback(FallbackReason::ClassifierFailed(e.to_string()), names),
            Err(_) => self.fallback(FallbackReason::ClassifierFailed("timeout".to_string()), names),
        }
    }

    fn fallback(&self, reason: FallbackReason, names: Vec<String>) -> Selection {
        if !matches!(reason, FallbackReason::NoCandidates) {
            warn!(default_agent = %self.params.default_agent, reason = %reason, "Selection degraded");
        }
        Selection::fallback(&self.params.default_agent, reason, names)
    }
}
