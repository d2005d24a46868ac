//! Progress statistics derived from the in-memory record set.
//!
//! Everything here is pure: the store recomputes these aggregates on every
//! snapshot replacement and publishes the result alongside the records.

use caplog_common::models::DailyRecord;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Length of the fixed completion-rate window, in days.
///
/// The denominator never shrinks for young accounts: five perfect days out of
/// five tracked still read as 5/30.
pub const COMPLETION_WINDOW_DAYS: i64 = 30;

/// Aggregates over one user's record set.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ProgressStats {
    /// Number of completed days overall.
    pub total_days: u32,
    /// Capsules taken across completed days.
    pub total_capsules: i64,
    /// Mean capsules per completed day; 0 when nothing is completed yet.
    pub average_capsules: f64,
    /// Consecutive completed calendar days ending today.
    pub current_streak: u32,
    /// Percentage of the trailing 30-day window with a completed record.
    pub completion_rate: f64,
}

/// Compute all aggregates for `records` as seen on the calendar date `today`.
///
/// Comparison is strictly date-only; the wall-clock `time` field of a record
/// never influences any aggregate.
pub fn compute(records: &[DailyRecord], today: NaiveDate) -> ProgressStats {
    let completed: Vec<&DailyRecord> = records.iter().filter(|r| r.completed).collect();

    let total_days = completed.len() as u32;
    let total_capsules: i64 = completed.iter().map(|r| i64::from(r.capsules)).sum();
    let average_capsules = if total_days == 0 {
        0.0
    } else {
        total_capsules as f64 / f64::from(total_days)
    };

    ProgressStats {
        total_days,
        total_capsules,
        average_capsules,
        current_streak: current_streak(&completed, today),
        completion_rate: completion_rate(&completed, today),
    }
}

/// Walk completed dates backward from today; the first gap ends the streak.
/// No completed record for today means the streak is already over.
fn current_streak(completed: &[&DailyRecord], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = completed.iter().map(|r| r.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let mut streak = 0u32;
    for (i, date) in dates.iter().enumerate() {
        if *date == today - Duration::days(i as i64) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Completed days inside the 30 calendar days ending today, over a fixed
/// denominator of 30.
fn completion_rate(completed: &[&DailyRecord], today: NaiveDate) -> f64 {
    let window_start = today - Duration::days(COMPLETION_WINDOW_DAYS - 1);
    let in_window = completed
        .iter()
        .filter(|r| r.date >= window_start && r.date <= today)
        .count();
    in_window as f64 / COMPLETION_WINDOW_DAYS as f64 * 100.0
}
