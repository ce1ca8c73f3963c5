use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::day::{DayKey, StepCount};
use crate::source::SourceKind;

/// Every state change in the orchestrator produces an Event.
/// Presentation code subscribes to them instead of polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepEvent {
    /// A data source was resolved and live updates started.
    Activated {
        source: SourceKind,
        at: DateTime<Utc>,
    },
    /// Today's count was re-read.
    TodayUpdated {
        day: DayKey,
        steps: StepCount,
        progress: f64,
        at: DateTime<Utc>,
    },
    /// One weekly-window entry landed.
    DayUpdated {
        day: DayKey,
        steps: StepCount,
        at: DateTime<Utc>,
    },
    /// Today's count crossed the goal from below.
    GoalReached {
        day: DayKey,
        steps: StepCount,
        goal: i64,
        at: DateTime<Utc>,
    },
    GoalChanged {
        goal: i64,
        at: DateTime<Utc>,
    },
}
