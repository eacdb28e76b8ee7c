//! Dispatch, selection and catalog parameters.
//!
//! Static knobs for [`Dispatcher`](crate::use_cases::dispatch::Dispatcher),
//! [`AgentSelector`](crate::use_cases::select_agent::AgentSelector) and
//! [`AgentCatalog`](crate::catalog::AgentCatalog). These are application-layer
//! concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution control for a single dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Upper bound on one agent execution. `None` disables the deadline.
    pub execution_timeout: Option<Duration>,
    /// Byte bound on `tool-result` summaries.
    pub tool_summary_bytes: usize,
    /// Buffered events between the forwarding loop and the caller.
    pub channel_capacity: usize,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            execution_timeout: Some(Duration::from_secs(180)),
            tool_summary_bytes: 500,
            channel_capacity: 64,
        }
    }
}

impl DispatchParams {
    // ==================== Builder Methods ====================

    pub fn with_execution_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.execution_timeout = timeout;
        self
    }

    pub fn with_tool_summary_bytes(mut self, bytes: usize) -> Self {
        self.tool_summary_bytes = bytes;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

/// Agent selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionParams {
    /// General-purpose agent every fallback lands on.
    pub default_agent: String,
    /// Deadline for the classification call.
    pub classifier_timeout: Duration,
    /// Ask the classifier to favour specialized agents on near-ties.
    pub prefer_specialized: bool,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            default_agent: "general".to_string(),
            classifier_timeout: Duration::from_secs(15),
            prefer_specialized: true,
        }
    }
}

impl SelectionParams {
    pub fn with_default_agent(mut self, name: impl Into<String>) -> Self {
        self.default_agent = name.into();
        self
    }

    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    pub fn with_prefer_specialized(mut self, prefer: bool) -> Self {
        self.prefer_specialized = prefer;
        self
    }
}

/// Catalog parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogParams {
    /// Deadline for a lazy factory, a directory listing, or a connect.
    pub factory_timeout: Duration,
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self {
            factory_timeout: Duration::from_secs(30),
        }
    }
}

impl CatalogParams {
    pub fn with_factory_timeout(mut self, timeout: Duration) -> Self {
        self.factory_timeout = timeout;
        self
    }
}
