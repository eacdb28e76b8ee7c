//! HTTP-backed agent and classifier adapters.
//!
//! - [`OpenAiClient`]: OpenAI-compatible chat completions (blocking + SSE)
//! - [`LlmAgent`]: streaming [`Agent`](relay_application::Agent) over the client
//! - [`LlmClassifier`]: JSON-schema constrained agent selection
//! - [`HttpAgent`]: external tools and peers reached by a plain JSON POST

pub mod error;
pub mod http_agent;
pub mod llm_agent;
pub mod llm_classifier;
pub mod openai;
mod sse;

pub use error::ProviderError;
pub use http_agent::HttpAgent;
pub use llm_agent::LlmAgent;
pub use llm_classifier::LlmClassifier;
pub use openai::{OpenAiClient, OpenAiSettings};
