//! Recurring jobs seeded from TOML (`[[jobs]]`)

use chrono::{DateTime, Utc};
use relay_domain::{
    ConfigIssue, ConfigIssueCode, Identity, JobId, RecurrenceKind, RecurrenceSpec, RecurringJob,
};
use serde::{Deserialize, Serialize};

/// One recurring job
///
/// ```toml
/// [[jobs]]
/// id = "morning-joke"
/// name = "Morning joke"
/// owner = "alice"
/// prompt = "Tell me a joke about programmers"
/// kind = "daily"                       # once, hourly, daily, weekly, custom-interval-days
/// anchor = "2024-01-01T09:00:00Z"      # first fire; defaults to load time
/// timezone = "Europe/Berlin"           # display only
/// interval_days = 3                    # custom-interval-days only
/// max_runs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJobConfig {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub prompt: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u32>,
}

impl Default for FileJobConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            owner: String::new(),
            prompt: String::new(),
            kind: "daily".to_string(),
            anchor: None,
            timezone: "UTC".to_string(),
            interval_days: None,
            max_runs: None,
        }
    }
}

impl FileJobConfig {
    /// Build the job, anchoring at `now` when no anchor is configured.
    pub fn to_job(&self, now: DateTime<Utc>) -> Result<RecurringJob, ConfigIssue> {
        let unschedulable = |reason: String| {
            ConfigIssue::error(
                ConfigIssueCode::UnschedulableJob {
                    job: self.id.clone(),
                },
                format!("jobs.{}: {}", self.id, reason),
            )
        };

        if self.id.trim().is_empty() {
            return Err(unschedulable("job id must not be empty".to_string()));
        }
        if self.prompt.trim().is_empty() {
            return Err(unschedulable("prompt must not be empty".to_string()));
        }

        let kind: RecurrenceKind = self.kind.parse().map_err(|_| {
            ConfigIssue::error(
                ConfigIssueCode::InvalidEnumValue {
                    field: format!("jobs.{}.kind", self.id),
                    value: self.kind.clone(),
                    valid_values: ["once", "hourly", "daily", "weekly", "custom-interval-days"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                format!("jobs.{}.kind: unknown value '{}'", self.id, self.kind),
            )
        })?;

        let anchor = match &self.anchor {
            Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| unschedulable(format!("invalid anchor '{}': {}", raw, e)))?,
            None => now,
        };

        let mut schedule = RecurrenceSpec::new(kind, anchor).with_timezone(self.timezone.trim());
        if let Some(days) = self.interval_days {
            schedule = schedule.with_interval_days(days);
        }
        if let Some(max) = self.max_runs {
            schedule = schedule.with_max_runs(max);
        }
        schedule
            .validate()
            .map_err(|e| unschedulable(e.to_string()))?;

        let name = if self.name.trim().is_empty() {
            self.id.trim()
        } else {
            self.name.trim()
        };
        let owner = if self.owner.trim().is_empty() {
            "default"
        } else {
            self.owner.trim()
        };

        Ok(RecurringJob::new(
            JobId::new(self.id.trim()),
            name,
            Identity::new(owner),
            self.prompt.trim(),
            schedule,
        ))
    }
}
