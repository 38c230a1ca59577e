//! Calendar time-lock for chapters.
//!
//! Each chapter has a real-world date before which it stays closed. The date
//! comparison lives in [`is_locked_at`] and [`remaining_at`], pure functions of
//! the schedule, the chapter and the current time. Whether the comparison is
//! applied at all is a separate switch on [`TimeLock`]; the shipped default
//! leaves it off, so every chapter reports as open.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::chapter::CHAPTER_COUNT;

/// First unlock date of the default schedule.
pub const DEFAULT_START: (i32, u32, u32) = (2026, 2, 7);

/// A daily schedule whose later dates fall outside the calendar chrono can
/// represent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("chapter {chapter} would open past the end of the calendar (start {start}, every {interval_days} days)")]
pub struct ScheduleError {
    pub start: NaiveDate,
    pub interval_days: u32,
    /// 1-based chapter whose date overflowed.
    pub chapter: usize,
}

/// Per-chapter unlock instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockSchedule {
    dates: [DateTime<Utc>; CHAPTER_COUNT],
}

impl UnlockSchedule {
    /// Chapter `i` opens at midnight UTC on `start + i * interval_days`.
    ///
    /// # Errors
    ///
    /// [`ScheduleError`] if a chapter's date cannot be represented.
    pub fn daily(start: NaiveDate, interval_days: u32) -> Result<Self, ScheduleError> {
        let midnight = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
        let mut dates = [midnight; CHAPTER_COUNT];
        for (index, date) in (0_i64..).zip(dates.iter_mut()) {
            *date = Duration::try_days(index * i64::from(interval_days))
                .and_then(|offset| midnight.checked_add_signed(offset))
                .ok_or(ScheduleError {
                    start,
                    interval_days,
                    chapter: usize::try_from(index).unwrap_or(CHAPTER_COUNT - 1) + 1,
                })?;
        }
        Ok(Self { dates })
    }

    /// Instant chapter `index` opens.
    ///
    /// # Panics
    ///
    /// Panics if `index >= CHAPTER_COUNT`.
    #[must_use]
    pub const fn unlock_at(&self, index: usize) -> DateTime<Utc> {
        self.dates[index]
    }
}

impl Default for UnlockSchedule {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_START;
        let start = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Self::daily(start, 1).unwrap_or(Self {
            dates: [DateTime::<Utc>::MIN_UTC; CHAPTER_COUNT],
        })
    }
}

/// True if chapter `index` has not reached its date at `now`.
#[must_use]
pub fn is_locked_at(schedule: &UnlockSchedule, index: usize, now: DateTime<Utc>) -> bool {
    now < schedule.unlock_at(index)
}

/// Time left until chapter `index` opens, zero once it has.
#[must_use]
pub fn remaining_at(schedule: &UnlockSchedule, index: usize, now: DateTime<Utc>) -> Duration {
    (schedule.unlock_at(index) - now).max(Duration::zero())
}

/// The schedule plus the switch that decides whether it is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLock {
    schedule: UnlockSchedule,
    enforce: bool,
}

impl Default for TimeLock {
    fn default() -> Self {
        Self::bypassed(UnlockSchedule::default())
    }
}

impl TimeLock {
    /// Keep the schedule but report every chapter as open.
    #[must_use]
    pub const fn bypassed(schedule: UnlockSchedule) -> Self {
        Self {
            schedule,
            enforce: false,
        }
    }

    /// Apply the schedule.
    #[must_use]
    pub const fn enforced(schedule: UnlockSchedule) -> Self {
        Self {
            schedule,
            enforce: true,
        }
    }

    #[must_use]
    pub const fn is_enforced(&self) -> bool {
        self.enforce
    }

    #[must_use]
    pub const fn schedule(&self) -> &UnlockSchedule {
        &self.schedule
    }

    /// Whether chapter `index` is held back by the calendar at `now`.
    #[must_use]
    pub fn is_locked(&self, index: usize, now: DateTime<Utc>) -> bool {
        self.enforce && is_locked_at(&self.schedule, index, now)
    }

    /// Wait before chapter `index` opens at `now`; zero when bypassed.
    #[must_use]
    pub fn time_until_unlock(&self, index: usize, now: DateTime<Utc>) -> Duration {
        if self.enforce {
            remaining_at(&self.schedule, index, now)
        } else {
            Duration::zero()
        }
    }
}

/// Render a wait like `2d 3h 15m`, or `now` when nothing is left.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "now".to_string();
    }
    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;
    match (days, hours) {
        (0, 0) => format!("{}m", minutes.max(1)),
        (0, _) => format!("{hours}h {minutes}m"),
        _ => format!("{days}d {hours}h {minutes}m"),
    }
}
