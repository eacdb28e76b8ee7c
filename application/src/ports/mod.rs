//! Port definitions
//!
//! Interfaces the use cases depend on. Adapters implement them in the
//! infrastructure layer.

pub mod agent;
pub mod classifier;
pub mod conversation_logger;
pub mod directory;
pub mod store;
