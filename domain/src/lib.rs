//! Domain layer for agent-relay
//!
//! Pure types and algorithms with no runtime or I/O dependencies.
//!
//! # Core Concepts
//!
//! ## Dispatch
//!
//! A [`TaskRequest`] is routed to exactly one agent (a [`Selection`]) and
//! executed; progress reaches the caller as an ordered sequence of
//! [`StreamEvent`]s ending in exactly one terminal event.
//!
//! ## Recurrence
//!
//! A [`RecurringJob`] fires on a [`RecurrenceSpec`]. Repeatable-content jobs
//! pre-generate a [`NoveltyBatch`] and serve one item per fire; other jobs
//! receive anti-repetition directives built from [`SimilarityWitness`]es.

pub mod agent;
pub mod core;
pub mod dispatch;
pub mod job;
pub mod novelty;
pub mod recurrence;
pub mod selection;
pub mod session;
pub mod task;
pub mod util;

// Re-export commonly used types
pub use agent::{
    descriptor::{AgentDescriptor, AgentOrigin, AgentStatus},
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use core::error::DomainError;
pub use dispatch::{
    event::{DispatchResult, DoneEvent, DoneMetadata, StreamEvent},
    sequence::{EventSequence, SequenceViolation, validate_sequence},
};
pub use job::{ExchangeRecord, JobId, RecurringJob};
pub use novelty::{
    batch::{NoveltyBatch, ServedItem},
    directive::{SimilarityWitness, anti_repetition_directive, augment_prompt, batch_generation_instruction},
    parsing::{BatchParseError, BatchPayload, parse_batch_payload},
    policy::{DEFAULT_REPEATABLE_PATTERNS, RepeatableContentPolicy},
};
pub use recurrence::spec::{Deactivation, FireTransition, RecurrenceKind, RecurrenceSpec, ScheduleError};
pub use selection::{
    entities::{Classification, FallbackReason, Selection, SelectionSource},
    parsing::{ClassificationParseError, parse_classification},
    prompt::{SelectionPromptTemplate, classification_schema},
};
pub use session::{
    entities::{Message, Role},
    stream::ExecutionEvent,
    usage::Usage,
};
pub use task::{
    command::parse_command,
    request::{Identity, RecurrenceContext, TaskRequest},
};
