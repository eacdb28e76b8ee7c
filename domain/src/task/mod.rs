//! Task requests and command addressing.

pub mod command;
pub mod request;
