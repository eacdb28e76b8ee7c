//! Use cases
//!
//! Application-specific business logic that orchestrates domain entities
//! and interacts with external systems through ports.

pub mod dispatch;
pub mod fire_job;
pub mod novelty;
pub mod poll_due;
pub mod route_task;
pub mod select_agent;
