//! Construction progress and deadline calculation.
//!
//! Progress is a linear interpolation of whole elapsed days over the planned
//! construction duration, clamped to `0..=100`. Deadlines are computed with
//! calendar-day arithmetic in the timestamp's own time zone.

use chrono::{DateTime, Days, Duration, LocalResult, TimeZone};
use serde::Deserialize;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// What to do with a construction duration of zero or fewer days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Treat the project as finished: 100% progress, deadline on the creation date.
    Complete,
    /// Substitute the configured default duration.
    #[default]
    Default,
    /// Refuse to compute anything for the record.
    Reject,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("construction duration must be positive, got {0} days")]
    NonPositiveDuration(i64),
    #[error("deadline falls outside the supported date range")]
    DeadlineOutOfRange,
}

/// Duration policy together with the default it may fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRules {
    pub policy: DurationPolicy,
    pub default_days: i64,
}

impl Default for DurationRules {
    fn default() -> Self {
        Self {
            policy: DurationPolicy::Default,
            default_days: 45,
        }
    }
}

impl DurationRules {
    pub fn new(policy: DurationPolicy, default_days: i64) -> Self {
        Self {
            policy,
            default_days,
        }
    }

    /// Duration actually planned for a project recorded with `days`.
    ///
    /// Positive values pass through. Anything else goes through the policy:
    /// `Complete` yields 0, `Default` the configured default.
    pub fn effective_days(&self, days: i64) -> Result<i64, ProgressError> {
        if days > 0 {
            return Ok(days);
        }
        match self.policy {
            DurationPolicy::Complete => Ok(0),
            DurationPolicy::Default if self.default_days > 0 => Ok(self.default_days),
            DurationPolicy::Default | DurationPolicy::Reject => {
                Err(ProgressError::NonPositiveDuration(days))
            }
        }
    }
}

/// Whole days between `from` and `to`, rounded towards negative infinity.
pub fn elapsed_days<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> i64 {
    (to.timestamp_millis() - from.timestamp_millis()).div_euclid(MILLIS_PER_DAY)
}

/// Completion percentage of a project at `now`, always within `0..=100`.
pub fn compute_progress<Tz: TimeZone>(
    created_at: &DateTime<Tz>,
    construction_days: i64,
    now: &DateTime<Tz>,
    rules: DurationRules,
) -> Result<f64, ProgressError> {
    let total = rules.effective_days(construction_days)?;
    if total == 0 {
        return Ok(100.0);
    }

    let raw = elapsed_days(created_at, now) as f64 / total as f64 * 100.0;
    Ok(raw.clamp(0.0, 100.0))
}

/// Planned completion date: `created_at` plus `construction_days` calendar days.
///
/// The days are added to the wall-clock date in `created_at`'s zone, so the
/// deadline lands on the right date across daylight-saving changes.
pub fn compute_deadline<Tz: TimeZone>(
    created_at: &DateTime<Tz>,
    construction_days: i64,
    rules: DurationRules,
) -> Result<DateTime<Tz>, ProgressError> {
    let days = rules.effective_days(construction_days)?;
    add_calendar_days(created_at, days)
}

fn add_calendar_days<Tz: TimeZone>(
    created_at: &DateTime<Tz>,
    days: i64,
) -> Result<DateTime<Tz>, ProgressError> {
    let days = u64::try_from(days).map_err(|_| ProgressError::NonPositiveDuration(days))?;
    let wall_clock = created_at
        .naive_local()
        .checked_add_days(Days::new(days))
        .ok_or(ProgressError::DeadlineOutOfRange)?;

    match created_at.timezone().from_local_datetime(&wall_clock) {
        LocalResult::Single(deadline) | LocalResult::Ambiguous(deadline, _) => Ok(deadline),
        // Wall-clock time skipped by a forward shift: keep the instant 24h-per-day away.
        LocalResult::None => created_at
            .clone()
            .checked_add_signed(Duration::days(days as i64))
            .ok_or(ProgressError::DeadlineOutOfRange),
    }
}
