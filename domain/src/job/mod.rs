//! Recurring jobs and their delivery history.

use crate::recurrence::spec::RecurrenceSpec;
use crate::task::request::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a recurring job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A task bound to a schedule that fires until deactivated (Entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringJob {
    pub id: JobId,
    pub name: String,
    pub owner: Identity,
    /// The natural-language task run on every fire.
    pub prompt: String,
    pub schedule: RecurrenceSpec,
}

impl RecurringJob {
    pub fn new(
        id: JobId,
        name: impl Into<String>,
        owner: Identity,
        prompt: impl Into<String>,
        schedule: RecurrenceSpec,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            prompt: prompt.into(),
            schedule,
        }
    }

    /// Whether this fire is the job's first.
    pub fn is_first_fire(&self) -> bool {
        self.schedule.run_count == 0
    }
}

/// One delivered (prompt, response) pair, kept for similarity lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub prompt: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub at: DateTime<Utc>,
}
