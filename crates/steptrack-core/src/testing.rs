//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::day::{DayKey, StepCount};
use crate::error::SourceError;
use crate::notify::NotificationSink;
use crate::source::{SourceKind, StepSource};

/// Map-backed source; unknown days read as 0.
pub struct MapSource {
    name: &'static str,
    steps: Mutex<HashMap<DayKey, StepCount>>,
    activation: Result<SourceKind, ()>,
    activations: AtomicUsize,
    delay: Duration,
    revision: watch::Sender<u64>,
}

impl MapSource {
    pub fn new(name: &'static str) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            name,
            steps: Mutex::new(HashMap::new()),
            activation: Ok(SourceKind::Primary),
            activations: AtomicUsize::new(0),
            delay: Duration::ZERO,
            revision,
        }
    }

    pub fn denying(mut self) -> Self {
        self.activation = Err(());
        self
    }

    /// Simulate a backend that answers asynchronously.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_day(self, day: DayKey, steps: StepCount) -> Self {
        self.set(day, steps);
        self
    }

    pub fn set(&self, day: DayKey, steps: StepCount) {
        self.steps.lock().unwrap().insert(day, steps);
    }

    /// Store a new value and announce it like a live backend would.
    pub fn push(&self, day: DayKey, steps: StepCount) {
        self.set(day, steps);
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StepSource for MapSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn steps_for_day(&self, day: DayKey) -> StepCount {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.steps.lock().unwrap().get(&day).copied().unwrap_or(0)
    }

    async fn activate(&self) -> Result<SourceKind, SourceError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.activation.map_err(|()| SourceError::Denied {
            source_name: self.name.to_string(),
            reason: "user declined".to_string(),
        })
    }

    fn changes(&self) -> Option<watch::Receiver<u64>> {
        Some(self.revision.subscribe())
    }
}

/// Answers successive calls from a fixed script, repeating the last value.
pub struct ScriptedSource {
    script: Mutex<VecDeque<StepCount>>,
    last: Mutex<StepCount>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = StepCount>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(0),
        }
    }
}

#[async_trait]
impl StepSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn steps_for_day(&self, _day: DayKey) -> StepCount {
        tokio::task::yield_now().await;
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

/// Counts each notification call.
#[derive(Default)]
pub struct RecordingSink {
    authorizations: AtomicUsize,
    reminders: AtomicUsize,
    goals: AtomicUsize,
}

impl RecordingSink {
    pub fn authorizations(&self) -> usize {
        self.authorizations.load(Ordering::SeqCst)
    }

    pub fn reminders(&self) -> usize {
        self.reminders.load(Ordering::SeqCst)
    }

    pub fn goals(&self) -> usize {
        self.goals.load(Ordering::SeqCst)
    }
}

impl NotificationSink for RecordingSink {
    fn request_authorization(&self) {
        self.authorizations.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_daily_reminder(&self) {
        self.reminders.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_goal_achieved(&self) {
        self.goals.fetch_add(1, Ordering::SeqCst);
    }
}
