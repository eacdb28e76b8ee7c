//! Route Task use case.
//!
//! select → resolve → dispatch for one [`TaskRequest`]. A selected agent that
//! cannot be resolved is replaced by the default agent; only when the default
//! agent is unresolvable too does the caller see a `failed` event.

use crate::catalog::AgentCatalog;
use crate::ports::agent::Agent;
use crate::use_cases::dispatch::{DispatchInput, DispatchStream, Dispatcher};
use crate::use_cases::select_agent::AgentSelector;
use relay_domain::{DispatchResult, FallbackReason, Selection, TaskRequest};
use std::sync::Arc;
use tracing::{error, warn};

/// Prompt overrides for a single routed task.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Replaces the task content as the final user message.
    pub prompt_override: Option<String>,
}

impl RouteOptions {
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt_override: Some(prompt.into()),
        }
    }
}

pub struct RouteTaskUseCase {
    catalog: Arc<AgentCatalog>,
    selector: Arc<AgentSelector>,
    dispatcher: Dispatcher,
}

impl RouteTaskUseCase {
    pub fn new(catalog: Arc<AgentCatalog>, selector: Arc<AgentSelector>, dispatcher: Dispatcher) -> Self {
        Self {
            catalog,
            selector,
            dispatcher,
        }
    }

    pub fn catalog(&self) -> &Arc<AgentCatalog> {
        &self.catalog
    }

    /// Route and start streaming.
    pub async fn start(&self, task: &TaskRequest, options: RouteOptions) -> DispatchStream {
        let selection = self.selector.select(task).await;
        let Some((selection, agent)) = self.resolve(task, selection).await else {
            return DispatchStream::failed("no agent available to handle the request");
        };

        let base = selection.task_content(&task.content);
        let prompt = options.prompt_override.as_deref().unwrap_or(base);
        let messages = task.messages_with_prompt(prompt);

        self.dispatcher.start(DispatchInput {
            messages,
            selection,
            agent,
        })
    }

    /// Route and wait for the terminal result.
    pub async fn execute(&self, task: &TaskRequest, options: RouteOptions) -> DispatchResult {
        self.start(task, options).await.into_result().await
    }

    async fn resolve(
        &self,
        task: &TaskRequest,
        selection: Selection,
    ) -> Option<(Selection, Arc<dyn Agent>)> {
        let identity = task.identity.as_ref();
        match self.catalog.resolve_for(&selection.agent, identity).await {
            Ok(agent) => return Some((selection, agent)),
            Err(e) => {
                warn!(agent = %selection.agent, error = %e, "Selected agent unavailable; using default");
            }
        }

        let default_agent = self.selector.default_agent();
        if selection.agent == default_agent {
            error!(agent = %default_agent, "Default agent unavailable");
            return None;
        }

        let fallback = Selection::fallback(
            default_agent,
            FallbackReason::Unresolvable(selection.agent.clone()),
            selection.candidates.clone(),
        );
        let fallback = match selection.rewritten_task {
            Some(task) => fallback.with_rewritten_task(task),
            None => fallback,
        };

        match self.catalog.resolve_for(default_agent, identity).await {
            Ok(agent) => Some((fallback, agent)),
            Err(e) => {
                error!(agent = %default_agent, error = %e, "Default agent unavailable");
                None
            }
        }
    }
}
