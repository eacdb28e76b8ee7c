//! Recurrence schedules and next-fire computation.
//!
//! A job fires when it is active and its
//! `next_fire` has passed; after a successful fire the run count increments,
//! the next fire is a fixed offset from the fire instant, and the job
//! deactivates when it was one-shot or has reached its maximum run count.
//!
//! Offsets are computed in UTC. `timezone` is an IANA name carried for
//! presentation; it never shifts the fixed offsets.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a schedule cannot produce a next fire time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("custom-interval-days schedule has no interval configured")]
    MissingInterval,
    #[error("custom-interval-days schedule has a zero-day interval")]
    ZeroInterval,
    #[error("next fire time is out of range")]
    OutOfRange,
}

/// How often a job repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrenceKind {
    Once,
    Hourly,
    Daily,
    Weekly,
    CustomIntervalDays,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Once => "once",
            RecurrenceKind::Hourly => "hourly",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::CustomIntervalDays => "custom-interval-days",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "once" => Ok(RecurrenceKind::Once),
            "hourly" => Ok(RecurrenceKind::Hourly),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "custom-interval-days" | "custom" => Ok(RecurrenceKind::CustomIntervalDays),
            other => Err(format!("unknown recurrence kind: {}", other)),
        }
    }
}

/// Why a fire deactivated its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deactivation {
    /// `once` jobs deactivate after their single fire.
    OneShot,
    /// `max_runs` was reached.
    MaxRunsReached,
}

/// State change produced by [`RecurrenceSpec::record_fire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireTransition {
    pub run_count: u32,
    pub next_fire: Option<DateTime<Utc>>,
    pub deactivated: Option<Deactivation>,
}

/// A job's schedule. Mutated only through [`record_fire`](Self::record_fire)
/// and [`defer`](Self::defer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub kind: RecurrenceKind,
    /// First scheduled fire.
    pub anchor: DateTime<Utc>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Day count for `custom-interval-days`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u32>,
    #[serde(default)]
    pub run_count: u32,
    pub is_active: bool,
    /// `None` means the schedule cannot fire again until corrected.
    #[serde(default)]
    pub next_fire: Option<DateTime<Utc>>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl RecurrenceSpec {
    /// An active schedule whose first fire is at `anchor`.
    pub fn new(kind: RecurrenceKind, anchor: DateTime<Utc>) -> Self {
        Self {
            kind,
            anchor,
            timezone: default_timezone(),
            interval_days: None,
            max_runs: None,
            run_count: 0,
            is_active: true,
            next_fire: Some(anchor),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_interval_days(mut self, days: u32) -> Self {
        self.interval_days = Some(days);
        self
    }

    pub fn with_max_runs(mut self, max: u32) -> Self {
        self.max_runs = Some(max);
        self
    }

    /// The fixed offset between fires; `Ok(None)` for one-shot jobs.
    pub fn period(&self) -> Result<Option<Duration>, ScheduleError> {
        match self.kind {
            RecurrenceKind::Once => Ok(None),
            RecurrenceKind::Hourly => Ok(Some(Duration::hours(1))),
            RecurrenceKind::Daily => Ok(Some(Duration::days(1))),
            RecurrenceKind::Weekly => Ok(Some(Duration::weeks(1))),
            RecurrenceKind::CustomIntervalDays => match self.interval_days {
                None => Err(ScheduleError::MissingInterval),
                Some(0) => Err(ScheduleError::ZeroInterval),
                Some(days) => Ok(Some(Duration::days(i64::from(days)))),
            },
        }
    }

    /// Check that the schedule can produce fire times.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.period().map(|_| ())
    }

    /// Next fire after a fire at `now`, or `None` when there is none:
    /// one-shot jobs, and misconfigured custom intervals.
    pub fn compute_next_fire(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.period() {
            Ok(Some(period)) => now.checked_add_signed(period),
            Ok(None) | Err(_) => None,
        }
    }

    /// Whether the run limit has been used up.
    pub fn max_runs_reached(&self) -> bool {
        self.max_runs.is_some_and(|max| self.run_count >= max)
    }

    /// Runs left before the limit, if one is set.
    pub fn remaining_runs(&self) -> Option<u32> {
        self.max_runs.map(|max| max.saturating_sub(self.run_count))
    }

    /// Eligible to fire: active, under its run limit, and `next_fire <= now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.max_runs_reached() && self.next_fire.is_some_and(|t| t <= now)
    }

    /// Apply a successful fire at `now`.
    pub fn record_fire(&mut self, now: DateTime<Utc>) -> FireTransition {
        self.run_count = self.run_count.saturating_add(1);
        self.next_fire = self.compute_next_fire(now);

        let deactivated = if self.max_runs_reached() {
            Some(Deactivation::MaxRunsReached)
        } else if self.kind == RecurrenceKind::Once {
            Some(Deactivation::OneShot)
        } else {
            None
        };

        if deactivated.is_some() {
            self.is_active = false;
            self.next_fire = None;
        }

        FireTransition {
            run_count: self.run_count,
            next_fire: self.next_fire,
            deactivated,
        }
    }

    /// Push the next fire to `until` without counting a run.
    pub fn defer(&mut self, until: DateTime<Utc>) {
        if self.is_active {
            self.next_fire = Some(until);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn daily_advances_one_day() {
        let spec = RecurrenceSpec::new(RecurrenceKind::Daily, at(2024, 1, 1, 9));
        assert_eq!(
            spec.compute_next_fire(at(2024, 1, 1, 9)),
            Some(at(2024, 1, 2, 9))
        );
    }

    #[test]
    fn hourly_and_weekly_offsets() {
        let now = at(2024, 1, 1, 9);
        let hourly = RecurrenceSpec::new(RecurrenceKind::Hourly, now);
        let weekly = RecurrenceSpec::new(RecurrenceKind::Weekly, now);
        assert_eq!(hourly.compute_next_fire(now), Some(at(2024, 1, 1, 10)));
        assert_eq!(weekly.compute_next_fire(now), Some(at(2024, 1, 8, 9)));
    }

    #[test]
    fn once_never_has_next_fire_and_deactivates() {
        let now = at(2024, 1, 1, 9);
        let mut spec = RecurrenceSpec::new(RecurrenceKind::Once, now);
        assert_eq!(spec.compute_next_fire(now), None);
        assert_eq!(spec.compute_next_fire(at(2030, 6, 1, 0)), None);

        let transition = spec.record_fire(now);
        assert_eq!(transition.deactivated, Some(Deactivation::OneShot));
        assert!(!spec.is_active);
        assert_eq!(spec.run_count, 1);
        assert!(!spec.is_due(at(2030, 1, 1, 0)));
    }

    #[test]
    fn custom_interval_uses_day_count() {
        let now = at(2024, 1, 1, 9);
        let spec = RecurrenceSpec::new(RecurrenceKind::CustomIntervalDays, now).with_interval_days(3);
        assert_eq!(spec.compute_next_fire(now), Some(at(2024, 1, 4, 9)));
    }

    #[test]
    fn custom_without_interval_is_inert_but_active() {
        let now = at(2024, 1, 1, 9);
        let mut spec = RecurrenceSpec::new(RecurrenceKind::CustomIntervalDays, now);
        assert_eq!(spec.validate(), Err(ScheduleError::MissingInterval));
        assert_eq!(spec.compute_next_fire(now), None);

        let transition = spec.record_fire(now);
        assert!(spec.is_active);
        assert_eq!(transition.next_fire, None);
        assert_eq!(transition.deactivated, None);
        assert!(!spec.is_due(at(2024, 2, 1, 0)));
    }

    #[test]
    fn zero_interval_is_misconfigured() {
        let spec = RecurrenceSpec::new(RecurrenceKind::CustomIntervalDays, at(2024, 1, 1, 0))
            .with_interval_days(0);
        assert_eq!(spec.validate(), Err(ScheduleError::ZeroInterval));
    }

    #[test]
    fn max_runs_deactivates_regardless_of_kind() {
        let mut spec = RecurrenceSpec::new(RecurrenceKind::Hourly, at(2024, 1, 1, 0)).with_max_runs(2);
        let first = spec.record_fire(at(2024, 1, 1, 0));
        assert_eq!(first.deactivated, None);
        assert_eq!(spec.remaining_runs(), Some(1));

        let second = spec.record_fire(at(2024, 1, 1, 1));
        assert_eq!(second.deactivated, Some(Deactivation::MaxRunsReached));
        assert!(!spec.is_active);
        assert_eq!(spec.next_fire, None);
    }

    #[test]
    fn due_only_when_active_and_time_passed() {
        let anchor = at(2024, 1, 1, 9);
        let mut spec = RecurrenceSpec::new(RecurrenceKind::Daily, anchor);
        assert!(!spec.is_due(at(2024, 1, 1, 8)));
        assert!(spec.is_due(anchor));
        spec.is_active = false;
        assert!(!spec.is_due(anchor));
    }

    #[test]
    fn defer_moves_next_fire_without_counting() {
        let anchor = at(2024, 1, 1, 9);
        let mut spec = RecurrenceSpec::new(RecurrenceKind::Daily, anchor);
        spec.defer(at(2024, 1, 1, 10));
        assert_eq!(spec.run_count, 0);
        assert_eq!(spec.next_fire, Some(at(2024, 1, 1, 10)));
    }

    #[test]
    fn kind_parses_aliases() {
        assert_eq!("daily".parse::<RecurrenceKind>(), Ok(RecurrenceKind::Daily));
        assert_eq!(
            "custom_interval_days".parse::<RecurrenceKind>(),
            Ok(RecurrenceKind::CustomIntervalDays)
        );
        assert!("fortnightly".parse::<RecurrenceKind>().is_err());
    }
}
