//! Weekly aggregates over a day-keyed snapshot.
//!
//! Pure functions: no state, no async, independent of map iteration order.

use serde::{Deserialize, Serialize};

use crate::day::{StepCount, WeeklyMap};

/// Truncating mean of the daily counts, 0 for an empty map.
///
/// Exact even when the plain sum would not fit a `StepCount`.
pub fn average(map: &WeeklyMap) -> StepCount {
    if map.is_empty() {
        return 0;
    }
    let sum: u128 = map.values().map(|&steps| u128::from(steps)).sum();
    // The mean never exceeds the largest entry, so it always fits.
    StepCount::try_from(sum / map.len() as u128).unwrap_or(StepCount::MAX)
}

/// Sum of the daily counts, 0 for an empty map. Saturates at `StepCount::MAX`.
pub fn total(map: &WeeklyMap) -> StepCount {
    map.values().fold(0, |sum, &steps| sum.saturating_add(steps))
}

/// Highest daily count, 0 for an empty map.
pub fn best(map: &WeeklyMap) -> StepCount {
    map.values().copied().max().unwrap_or(0)
}

/// All three aggregates for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub days: usize,
    pub total: StepCount,
    pub average: StepCount,
    pub best: StepCount,
}

pub fn summarize(map: &WeeklyMap) -> WeeklySummary {
    WeeklySummary {
        days: map.len(),
        total: total(map),
        average: average(map),
        best: best(map),
    }
}
