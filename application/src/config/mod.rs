//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DispatchParams`]: execution deadline, tool summary bound, channel capacity
//! - [`SelectionParams`]: default agent and classifier deadline
//! - [`CatalogParams`]: lazy factory deadline
//! - [`NoveltyParams`] / [`FireParams`]: recurring-job behavior
//! - [`RelayConfig`]: container for the binary

pub mod dispatch_params;
pub mod novelty_params;
pub mod relay_config;

pub use dispatch_params::{CatalogParams, DispatchParams, SelectionParams};
pub use novelty_params::{FireParams, NoveltyParams};
pub use relay_config::RelayConfig;
