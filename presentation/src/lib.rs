//! Presentation layer for agent-relay
//!
//! This crate contains the HTTP/SSE surface, CLI definitions and console
//! output formatting.

pub mod cli;
pub mod output;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use server::{ServerState, router, serve};
