//! Application layer for agent-relay
//!
//! This crate contains the agent catalog, use cases, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod catalog;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use catalog::{AgentCatalog, AgentFactory, CatalogError, agent_factory};
pub use config::{
    CatalogParams, DispatchParams, FireParams, NoveltyParams, RelayConfig, SelectionParams,
};
pub use ports::{
    agent::{Agent, AgentError, AgentOutput, ExecutionHandle},
    classifier::{AgentClassifier, ClassifierError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    directory::{AgentDirectory, DirectoryEntry, DirectoryError},
    store::{BatchStore, HistoryStore, JobStore, SimilarityQuery, SimilaritySource, StoreError},
};
pub use use_cases::dispatch::{DispatchInput, DispatchStream, Dispatcher};
pub use use_cases::fire_job::{
    Delivery, FireError, FireJobUseCase, FireOutcome, JobGuard, JobLocks, SkipReason,
};
pub use use_cases::novelty::{DispatchPlan, NoveltyPipeline, NoveltyPlan, ServePlan};
pub use use_cases::poll_due::{PollDueJobs, PollReport};
pub use use_cases::route_task::{RouteOptions, RouteTaskUseCase};
pub use use_cases::select_agent::AgentSelector;
