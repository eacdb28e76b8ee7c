//! Port for structured transcript logging.
//!
//! Records routing decisions and outcomes (`selection`, `dispatch_done`,
//! `dispatch_failed`, `batch_served`, `batch_created`) as machine-readable
//! records, separate from `tracing` diagnostics.

use serde_json::Value;

/// A structured transcript event: a type string and a JSON payload.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for transcript events.
///
/// `log` is synchronous and infallible; implementations swallow write
/// failures.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
