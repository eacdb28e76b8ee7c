//! Dispatch streaming protocol.

pub mod event;
pub mod sequence;
