//! Infrastructure layer for agent-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod bootstrap;
pub mod classifier;
pub mod config;
pub mod directory;
pub mod logging;
pub mod providers;
pub mod store;

// Re-export commonly used types
pub use classifier::KeywordClassifier;
pub use config::{ConfigLoader, FileConfig};
pub use directory::ConfiguredDirectory;
pub use logging::JsonlConversationLogger;
pub use providers::{
    HttpAgent, LlmAgent, LlmClassifier, OpenAiClient, OpenAiSettings, ProviderError,
};
pub use store::InMemoryStore;
