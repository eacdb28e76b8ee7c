//! Recurrence engine: schedules, due checks and next-fire computation.

pub mod spec;
