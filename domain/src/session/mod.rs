//! Conversation messages and substrate-level streaming.

pub mod entities;
pub mod stream;
pub mod usage;
