//! Terminal notification sink.
//!
//! A terminal cannot raise OS notifications, so requests are logged and
//! written to stderr as JSON lines for whatever wraps the CLI to deliver.

use serde_json::json;
use steptrack_core::notify::{NotificationRequest, NotificationSink};
use steptrack_core::Config;

pub struct ConsoleNotifier {
    enabled: bool,
    reminder_hour: u32,
    reminder_minute: u32,
}

impl ConsoleNotifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.notifications.enabled,
            reminder_hour: config.notifications.reminder_hour,
            reminder_minute: config.notifications.reminder_minute,
        }
    }

    /// Drops every request; for one-shot commands that have no history to
    /// detect a real crossing against.
    pub fn muted() -> Self {
        Self {
            enabled: false,
            reminder_hour: 0,
            reminder_minute: 0,
        }
    }

    fn deliver(&self, request: NotificationRequest) {
        if !self.enabled {
            tracing::debug!(id = %request.identifier, "notifications disabled, dropping request");
            return;
        }
        tracing::info!(id = %request.identifier, "notification scheduled");
        eprintln!("{}", json!({ "notification": request }));
    }
}

impl NotificationSink for ConsoleNotifier {
    fn request_authorization(&self) {
        if self.enabled {
            tracing::info!("notification permission granted");
        }
    }

    fn schedule_daily_reminder(&self) {
        self.deliver(NotificationRequest::daily_reminder(
            self.reminder_hour,
            self.reminder_minute,
        ));
    }

    fn schedule_goal_achieved(&self) {
        self.deliver(NotificationRequest::goal_achieved());
    }
}
