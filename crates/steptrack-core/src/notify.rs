//! Outgoing notification capability.
//!
//! The core only ever asks for three things: permission, a repeating daily
//! reminder and a one-shot "goal achieved" notice. Delivery is the sink's
//! business; the core never waits on or inspects the outcome.

use serde::{Deserialize, Serialize};

/// Receiver of the three opaque notification calls.
///
/// Implementations are constructed by the composition root and injected into
/// the orchestrator. All calls are fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn request_authorization(&self);

    fn schedule_daily_reminder(&self);

    fn schedule_goal_achieved(&self);
}

/// When a scheduled notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// One-shot, shortly after scheduling.
    AfterSecs { secs: u64 },
    /// Repeats every day at the given local wall-clock time.
    DailyAt { hour: u32, minute: u32 },
}

/// Description of a notification a sink may deliver.
///
/// Scheduling the same identifier twice replaces the earlier request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
}

pub const GOAL_ACHIEVED_ID: &str = "goalAchieved";
pub const DAILY_REMINDER_ID: &str = "dailyReminder";

impl NotificationRequest {
    pub fn goal_achieved() -> Self {
        Self {
            identifier: GOAL_ACHIEVED_ID.to_string(),
            title: "Goal Achieved!".to_string(),
            body: "Congratulations! You've reached your daily step goal.".to_string(),
            trigger: Trigger::AfterSecs { secs: 1 },
        }
    }

    pub fn daily_reminder(hour: u32, minute: u32) -> Self {
        Self {
            identifier: DAILY_REMINDER_ID.to_string(),
            title: "Stay Active!".to_string(),
            body: "Don't forget to stay active today. Every step counts towards your daily goal."
                .to_string(),
            trigger: Trigger::DailyAt { hour, minute },
        }
    }
}
