//! Fallback source: live pedometer deltas accumulated into a day session.
//!
//! The sensor side holds a [`PedometerFeed`] and pushes step deltas as they
//! arrive. The running session starts at the current day's start; the first
//! delta stamped on a later day restarts it at 0. Only the session's own day
//! has a count, every other day reads as 0.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use tokio::sync::watch;

use super::{SourceKind, StepSource};
use crate::day::{Clock, DayKey, StepCount, SystemClock};
use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Session {
    day: DayKey,
    steps: StepCount,
}

struct Shared {
    session: Mutex<Option<Session>>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn session(&self) -> Option<Session> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// Step counting from a motion sensor session.
pub struct PedometerSource {
    available: bool,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
}

/// Sensor-side handle feeding deltas into a [`PedometerSource`].
#[derive(Clone)]
pub struct PedometerFeed {
    shared: Arc<Shared>,
}

impl PedometerSource {
    /// `available` is the device capability check; an unavailable pedometer
    /// refuses activation and reads 0 for every day.
    pub fn new(available: bool) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            available,
            clock: Arc::new(SystemClock),
            shared: Arc::new(Shared {
                session: Mutex::new(None),
                revision,
            }),
        }
    }

    /// Open the activation session on `clock`'s day instead of the wall
    /// clock's, keeping it aligned with the orchestrator's notion of today.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn feed(&self) -> PedometerFeed {
        PedometerFeed {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl PedometerFeed {
    /// Open a session for `day` unless one for that day or a later one runs.
    pub fn start_session(&self, day: DayKey) {
        let mut session = self.shared.session.lock().unwrap_or_else(|e| e.into_inner());
        match *session {
            Some(current) if current.day >= day => {}
            _ => {
                tracing::debug!(%day, "pedometer session started");
                *session = Some(Session { day, steps: 0 });
            }
        }
    }

    /// Add `delta` steps observed at `at`.
    ///
    /// Deltas stamped before the running session's day are dropped.
    pub fn record<Tz: TimeZone>(&self, at: &DateTime<Tz>, delta: StepCount) {
        let day = DayKey::from_instant(at);
        {
            let mut session = self.shared.session.lock().unwrap_or_else(|e| e.into_inner());
            let current = match *session {
                Some(current) if current.day == day => current,
                Some(current) if current.day > day => {
                    tracing::debug!(%day, session_day = %current.day, "dropping stale pedometer delta");
                    return;
                }
                _ => Session { day, steps: 0 },
            };
            *session = Some(Session {
                day,
                steps: current.steps.saturating_add(delta),
            });
        }
        self.shared.bump();
    }

    /// Running total for `day`, 0 if no session covers it.
    pub fn steps_for(&self, day: DayKey) -> StepCount {
        self.shared
            .session()
            .filter(|session| session.day == day)
            .map(|session| session.steps)
            .unwrap_or(0)
    }
}

#[async_trait]
impl StepSource for PedometerSource {
    fn name(&self) -> &str {
        "pedometer"
    }

    async fn steps_for_day(&self, day: DayKey) -> StepCount {
        if !self.available {
            return 0;
        }
        self.feed().steps_for(day)
    }

    async fn activate(&self) -> Result<SourceKind, SourceError> {
        if !self.available {
            return Err(SourceError::Unavailable(self.name().to_string()));
        }
        self.feed().start_session(self.clock.today());
        Ok(SourceKind::Fallback)
    }

    fn changes(&self) -> Option<watch::Receiver<u64>> {
        self.available.then(|| self.shared.revision.subscribe())
    }
}
