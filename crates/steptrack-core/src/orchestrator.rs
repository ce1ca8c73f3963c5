//! Step orchestrator.
//!
//! Owns today's count, the rolling seven-day window and the daily goal. It
//! drives source activation, issues day fetches, merges their results and
//! fires the goal-achieved notification once per upward goal crossing.
//!
//! ## Phases
//!
//! ```text
//! Uninitialized -> Authorizing -> Active(source kind)
//! ```
//!
//! Construction with side effects disabled stays in `Uninitialized` and
//! touches neither the source's authorization nor the notification sink, so
//! the orchestrator can be driven directly in isolation.
//!
//! ## Concurrency
//!
//! All state lives behind one mutex and every fetch completion applies its
//! update in a single critical section. Nothing is awaited while the lock is
//! held. Weekly fetches write disjoint keys and run unordered.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::day::{Clock, DayKey, StepCount, WeeklyMap};
use crate::events::StepEvent;
use crate::notify::NotificationSink;
use crate::source::{SourceKind, StepSource};

/// Days in the rolling window, today included.
pub const WEEK_DAYS: usize = 7;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "source", rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Authorizing,
    Active(SourceKind),
}

/// Everything the orchestrator tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub today_steps: StepCount,
    pub goal_steps: i64,
    pub weekly_steps: WeeklyMap,
    /// Set once live updates start; never cleared.
    pub is_updating: bool,
    /// Latched when the goal notification fires, released when today's
    /// count is next observed below the goal.
    pub has_crossed_goal: bool,
}

impl OrchestratorState {
    fn new(goal_steps: i64) -> Self {
        Self {
            today_steps: 0,
            goal_steps,
            weekly_steps: WeeklyMap::new(),
            is_updating: false,
            has_crossed_goal: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Request authorizations and start live updates on construction.
    pub enable_side_effects: bool,
    pub initial_goal: i64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            enable_side_effects: true,
            initial_goal: 10_000,
        }
    }
}

/// Fraction of the goal reached, clipped to `[0.0, 1.0]`.
///
/// Non-positive goals, negative counts and non-finite ratios all yield 0.
pub fn goal_progress(today_steps: i64, goal_steps: i64) -> f64 {
    if goal_steps <= 0 || today_steps < 0 {
        return 0.0;
    }
    let ratio = today_steps as f64 / goal_steps as f64;
    if ratio.is_finite() {
        ratio.min(1.0)
    } else {
        0.0
    }
}

/// Upward crossing: the previous count was below the goal, the new one is not.
pub fn goal_crossed(old_steps: StepCount, new_steps: StepCount, goal_steps: i64) -> bool {
    as_signed(old_steps) < goal_steps && as_signed(new_steps) >= goal_steps
}

fn as_signed(steps: StepCount) -> i64 {
    i64::try_from(steps).unwrap_or(i64::MAX)
}

/// In-flight weekly fetches started by [`StepOrchestrator::load_weekly_data`].
///
/// Dropping the handle leaves the fetches running; each one still writes its
/// own day when it lands.
pub struct WeeklyLoad {
    fetches: Vec<JoinHandle<(DayKey, StepCount)>>,
}

impl WeeklyLoad {
    pub fn len(&self) -> usize {
        self.fetches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetches.is_empty()
    }

    /// Wait for every fetch of this load and return what each one wrote.
    pub async fn wait(self) -> WeeklyMap {
        let mut landed = WeeklyMap::new();
        for fetch in self.fetches {
            match fetch.await {
                Ok((day, steps)) => {
                    landed.insert(day, steps);
                }
                Err(e) => tracing::warn!("weekly fetch task failed: {e}"),
            }
        }
        landed
    }
}

/// Stateful owner of today's count, the weekly window and the goal.
pub struct StepOrchestrator {
    source: Arc<dyn StepSource>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    state: Mutex<OrchestratorState>,
    phase: watch::Sender<Phase>,
    events: broadcast::Sender<StepEvent>,
    /// Receiver created with the channel, handed to the first subscriber.
    first_subscriber: Mutex<Option<broadcast::Receiver<StepEvent>>>,
}

impl StepOrchestrator {
    /// Build an orchestrator around an injected source, sink and clock.
    ///
    /// With side effects enabled this moves to `Authorizing` and spawns the
    /// initialization task on the current tokio runtime: notification
    /// authorization, the daily reminder, source activation, then live
    /// updates. Without a runtime initialization is skipped with a warning.
    pub fn new(
        settings: OrchestratorSettings,
        source: Arc<dyn StepSource>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        let (events, first_subscriber) = broadcast::channel(EVENT_CAPACITY);
        let this = Arc::new(Self {
            source,
            notifier,
            clock,
            state: Mutex::new(OrchestratorState::new(settings.initial_goal)),
            phase,
            events,
            first_subscriber: Mutex::new(Some(first_subscriber)),
        });

        if settings.enable_side_effects {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    this.phase.send_replace(Phase::Authorizing);
                    runtime.spawn(Arc::clone(&this).initialize());
                }
                Err(_) => {
                    tracing::warn!("no async runtime available, step orchestrator left uninitialized");
                }
            }
        }
        this
    }

    fn state(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: StepEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn initialize(self: Arc<Self>) {
        self.notifier.request_authorization();
        self.notifier.schedule_daily_reminder();

        let kind = match self.source.activate().await {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(source = self.source.name(), "step source activation failed: {e}");
                SourceKind::Fallback
            }
        };
        self.start_updating(kind).await;
    }

    async fn start_updating(self: &Arc<Self>, kind: SourceKind) {
        self.state().is_updating = true;

        if let Some(changes) = self.source.changes() {
            tokio::spawn(follow_changes(Arc::downgrade(self), changes));
        }

        self.phase.send_replace(Phase::Active(kind));
        tracing::info!(source = self.source.name(), ?kind, "step orchestrator active");
        self.emit(StepEvent::Activated {
            source: kind,
            at: Utc::now(),
        });

        self.fetch_today_steps().await;
        // Weekly entries land on their own; nothing waits for them here.
        drop(self.load_weekly_data());
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn today_steps(&self) -> StepCount {
        self.state().today_steps
    }

    pub fn goal_steps(&self) -> i64 {
        self.state().goal_steps
    }

    pub fn weekly_steps(&self) -> WeeklyMap {
        self.state().weekly_steps.clone()
    }

    pub fn is_updating(&self) -> bool {
        self.state().is_updating
    }

    pub fn has_crossed_goal(&self) -> bool {
        self.state().has_crossed_goal
    }

    pub fn snapshot(&self) -> OrchestratorState {
        self.state().clone()
    }

    /// Today's progress towards the goal, reading the latest goal.
    pub fn progress(&self) -> f64 {
        let state = self.state();
        goal_progress(as_signed(state.today_steps), state.goal_steps)
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Resolve once the orchestrator is `Active`.
    ///
    /// Never resolves for an orchestrator built without side effects.
    pub async fn wait_until_active(&self) -> SourceKind {
        let mut phase = self.phase.subscribe();
        loop {
            if let Phase::Active(kind) = *phase.borrow_and_update() {
                return kind;
            }
            if phase.changed().await.is_err() {
                // Sender lives in self; unreachable while we are borrowed.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Stream of state changes.
    ///
    /// The first call receives every event since construction, so a caller
    /// subscribing right after [`new`](Self::new) does not miss `Activated`
    /// from the already spawned initialization. Later calls only see events
    /// sent after they subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<StepEvent> {
        self.first_subscriber
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .unwrap_or_else(|| self.events.subscribe())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the goal. Crossing detection picks it up on the next fetch.
    pub fn set_goal(&self, goal_steps: i64) {
        self.state().goal_steps = goal_steps;
        tracing::debug!(goal_steps, "goal changed");
        self.emit(StepEvent::GoalChanged {
            goal: goal_steps,
            at: Utc::now(),
        });
    }

    /// Re-read today's count and run goal-crossing detection.
    ///
    /// Returns the count that was applied.
    pub async fn fetch_today_steps(&self) -> StepCount {
        self.fetch_today().await.1
    }

    /// Like [`fetch_today_steps`](Self::fetch_today_steps), also returning
    /// the day the clock resolved for this fetch.
    pub async fn fetch_today(&self) -> (DayKey, StepCount) {
        let day = self.clock.today();
        let steps = self.source.steps_for_day(day).await;

        let (goal, crossed, progress) = {
            let mut state = self.state();
            let old_steps = state.today_steps;
            state.today_steps = steps;
            state.weekly_steps.insert(day, steps);

            let goal = state.goal_steps;
            let crossed = goal_crossed(old_steps, steps, goal);
            if crossed {
                state.has_crossed_goal = true;
            } else if as_signed(steps) < goal {
                state.has_crossed_goal = false;
            }
            (goal, crossed, goal_progress(as_signed(steps), goal))
        };

        tracing::debug!(%day, steps, goal, "today's steps updated");
        self.emit(StepEvent::TodayUpdated {
            day,
            steps,
            progress,
            at: Utc::now(),
        });

        if crossed {
            tracing::info!(%day, steps, goal, "daily goal reached");
            self.notifier.schedule_goal_achieved();
            self.emit(StepEvent::GoalReached {
                day,
                steps,
                goal,
                at: Utc::now(),
            });
        }
        (day, steps)
    }

    /// Fetch the seven most recent days concurrently.
    ///
    /// Each completion writes only its own day. Goal crossing is not evaluated
    /// here, even for today's entry, and `today_steps` is left alone.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn load_weekly_data(self: &Arc<Self>) -> WeeklyLoad {
        let today = self.clock.today();
        let fetches = DayKey::recent(WEEK_DAYS, today)
            .into_iter()
            .map(|day| {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    let steps = this.source.steps_for_day(day).await;
                    this.record_day(day, steps);
                    (day, steps)
                })
            })
            .collect();
        WeeklyLoad { fetches }
    }

    fn record_day(&self, day: DayKey, steps: StepCount) {
        self.state().weekly_steps.insert(day, steps);
        tracing::debug!(%day, steps, "weekly entry updated");
        self.emit(StepEvent::DayUpdated {
            day,
            steps,
            at: Utc::now(),
        });
    }
}

/// Re-fetch today whenever the source reports new data.
///
/// Ends when the orchestrator is dropped or the source stops publishing.
async fn follow_changes(orchestrator: Weak<StepOrchestrator>, mut changes: watch::Receiver<u64>) {
    while changes.changed().await.is_ok() {
        let Some(orchestrator) = orchestrator.upgrade() else {
            return;
        };
        orchestrator.fetch_today_steps().await;
    }
    tracing::debug!("step source change feed closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::FixedClock;
    use crate::source::ResolvingSource;
    use crate::testing::{MapSource, RecordingSink, ScriptedSource};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn today() -> DayKey {
        DayKey::from_date(NaiveDate::from_ymd_opt(2025, 9, 5).unwrap())
    }

    fn isolated(
        source: Arc<dyn StepSource>,
        goal: i64,
    ) -> (Arc<StepOrchestrator>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings {
                enable_side_effects: false,
                initial_goal: goal,
            },
            source,
            sink.clone(),
            Arc::new(FixedClock::new(today())),
        );
        (orchestrator, sink)
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met within 2s");
    }

    #[test]
    fn progress_with_zero_goal_is_zero() {
        assert_eq!(goal_progress(100, 0), 0.0);
        assert_eq!(goal_progress(100, -5), 0.0);
    }

    #[test]
    fn progress_with_negative_steps_is_zero() {
        assert_eq!(goal_progress(-10, 1000), 0.0);
    }

    #[test]
    fn progress_is_a_plain_fraction() {
        assert!((goal_progress(4000, 8000) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn progress_caps_at_one() {
        assert_eq!(goal_progress(6000, 5000), 1.0);
        assert_eq!(goal_progress(i64::MAX, 1), 1.0);
    }

    #[test]
    fn crossing_requires_coming_from_below() {
        assert!(goal_crossed(899, 1000, 900));
        assert!(goal_crossed(0, 900, 900));
        assert!(!goal_crossed(1000, 1200, 900));
        assert!(!goal_crossed(100, 500, 900));
        assert!(!goal_crossed(0, 500, 0));
    }

    #[tokio::test]
    async fn progress_reads_fetched_steps_and_latest_goal() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 4000));
        let (orchestrator, _) = isolated(source, 8000);
        orchestrator.fetch_today_steps().await;
        assert!((orchestrator.progress() - 0.5).abs() < 1e-9);

        orchestrator.set_goal(0);
        assert_eq!(orchestrator.progress(), 0.0);

        orchestrator.set_goal(3000);
        assert_eq!(orchestrator.progress(), 1.0);
    }

    #[tokio::test]
    async fn fetch_today_updates_today_and_weekly_entry() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 3456));
        let (orchestrator, _) = isolated(source, 10_000);

        assert_eq!(orchestrator.fetch_today_steps().await, 3456);
        assert_eq!(orchestrator.today_steps(), 3456);
        assert_eq!(orchestrator.weekly_steps().get(&today()), Some(&3456));
    }

    #[tokio::test]
    async fn weekly_load_fills_seven_days() {
        let source = MapSource::new("map").with_delay(Duration::from_millis(5));
        let mut expected = WeeklyMap::new();
        for back in 0..7u64 {
            let day = today().offset(-(back as i64));
            source.set(day, (back + 1) * 100);
            expected.insert(day, (back + 1) * 100);
        }
        let (orchestrator, sink) = isolated(Arc::new(source), 10_000);

        let load = orchestrator.load_weekly_data();
        assert_eq!(load.len(), WEEK_DAYS);
        let landed = load.wait().await;

        assert_eq!(landed, expected);
        assert_eq!(orchestrator.weekly_steps(), expected);
        assert_eq!(sink.goals(), 0);
    }

    #[tokio::test]
    async fn goal_notification_fires_once_per_crossing() {
        let source = Arc::new(ScriptedSource::new([899, 1000, 1200, 500, 950]));
        let (orchestrator, sink) = isolated(source, 900);

        orchestrator.fetch_today_steps().await;
        assert_eq!(orchestrator.today_steps(), 899);
        assert_eq!(sink.goals(), 0);

        orchestrator.fetch_today_steps().await;
        assert_eq!(sink.goals(), 1);
        assert!(orchestrator.has_crossed_goal());

        orchestrator.fetch_today_steps().await;
        assert_eq!(sink.goals(), 1, "staying above goal must not refire");

        orchestrator.fetch_today_steps().await;
        assert_eq!(sink.goals(), 1);
        assert!(!orchestrator.has_crossed_goal());

        orchestrator.fetch_today_steps().await;
        assert_eq!(sink.goals(), 2);
        assert!(orchestrator.has_crossed_goal());
    }

    #[tokio::test]
    async fn weekly_load_never_fires_goal_or_touches_today() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 20_000));
        let (orchestrator, sink) = isolated(source, 900);

        orchestrator.load_weekly_data().wait().await;

        assert_eq!(orchestrator.weekly_steps().get(&today()), Some(&20_000));
        assert_eq!(orchestrator.today_steps(), 0);
        assert_eq!(sink.goals(), 0);
        assert!(!orchestrator.has_crossed_goal());
    }

    #[tokio::test]
    async fn goal_change_during_fetch_uses_latest_goal() {
        let source = Arc::new(
            MapSource::new("map")
                .with_day(today(), 1000)
                .with_delay(Duration::from_millis(50)),
        );
        let (orchestrator, sink) = isolated(source, 10_000);

        let pending = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.fetch_today_steps().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        orchestrator.set_goal(900);
        pending.await.unwrap();

        assert_eq!(sink.goals(), 1);
        assert_eq!(orchestrator.progress(), 1.0);
    }

    #[tokio::test]
    async fn day_rollover_keeps_old_entries() {
        let clock = Arc::new(FixedClock::new(today()));
        let source = Arc::new(
            MapSource::new("map")
                .with_day(today(), 8000)
                .with_day(today().next(), 150),
        );
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings {
                enable_side_effects: false,
                initial_goal: 5000,
            },
            source,
            sink.clone(),
            clock.clone(),
        );

        orchestrator.fetch_today_steps().await;
        clock.advance(1);
        orchestrator.fetch_today_steps().await;

        let weekly = orchestrator.weekly_steps();
        assert_eq!(weekly.get(&today()), Some(&8000));
        assert_eq!(weekly.get(&today().next()), Some(&150));
        assert_eq!(orchestrator.today_steps(), 150);
        assert_eq!(sink.goals(), 1);
    }

    #[tokio::test]
    async fn disabled_side_effects_stay_uninitialized() {
        let source = Arc::new(MapSource::new("map"));
        let (orchestrator, sink) = isolated(source.clone(), 10_000);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(orchestrator.phase(), Phase::Uninitialized);
        assert!(!orchestrator.is_updating());
        assert_eq!(sink.authorizations(), 0);
        assert_eq!(sink.reminders(), 0);
        assert_eq!(source.activations(), 0);
    }

    #[tokio::test]
    async fn side_effects_activate_and_start_updates() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 1234));
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings::default(),
            source.clone(),
            sink.clone(),
            Arc::new(FixedClock::new(today())),
        );

        let kind = tokio::time::timeout(Duration::from_secs(2), orchestrator.wait_until_active())
            .await
            .unwrap();
        assert_eq!(kind, SourceKind::Primary);
        assert!(orchestrator.is_updating());
        assert_eq!(sink.authorizations(), 1);
        assert_eq!(sink.reminders(), 1);
        assert_eq!(source.activations(), 1);

        eventually(|| orchestrator.weekly_steps().len() == WEEK_DAYS).await;
        assert_eq!(orchestrator.today_steps(), 1234);
    }

    #[tokio::test]
    async fn denied_primary_activates_via_fallback() {
        let primary = Arc::new(MapSource::new("primary").denying().with_day(today(), 9999));
        let fallback = Arc::new(MapSource::new("fallback").with_day(today(), 42));
        let source = Arc::new(ResolvingSource::new(primary, fallback));
        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings::default(),
            source,
            Arc::new(RecordingSink::default()),
            Arc::new(FixedClock::new(today())),
        );

        let kind = tokio::time::timeout(Duration::from_secs(2), orchestrator.wait_until_active())
            .await
            .unwrap();
        assert_eq!(kind, SourceKind::Fallback);
        eventually(|| orchestrator.today_steps() == 42).await;
    }

    #[tokio::test]
    async fn source_changes_trigger_refetch_and_crossing() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 100));
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings {
                enable_side_effects: true,
                initial_goal: 500,
            },
            source.clone(),
            sink.clone(),
            Arc::new(FixedClock::new(today())),
        );
        orchestrator.wait_until_active().await;
        eventually(|| orchestrator.today_steps() == 100).await;

        source.push(today(), 700);
        eventually(|| orchestrator.today_steps() == 700).await;
        eventually(|| sink.goals() == 1).await;
    }

    #[tokio::test]
    async fn events_describe_fetch_and_crossing() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 1000));
        let (orchestrator, _) = isolated(source, 900);
        let mut events = orchestrator.subscribe();

        orchestrator.fetch_today_steps().await;

        match events.recv().await.unwrap() {
            StepEvent::TodayUpdated { day, steps, progress, .. } => {
                assert_eq!(day, today());
                assert_eq!(steps, 1000);
                assert_eq!(progress, 1.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            events.recv().await.unwrap(),
            StepEvent::GoalReached { steps: 1000, goal: 900, .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn subscriber_created_after_new_still_sees_activation() {
        for _ in 0..50 {
            let source = Arc::new(MapSource::new("map").with_day(today(), 2000));
            let orchestrator = StepOrchestrator::new(
                OrchestratorSettings {
                    enable_side_effects: true,
                    initial_goal: 1000,
                },
                source,
                Arc::new(RecordingSink::default()),
                Arc::new(FixedClock::new(today())),
            );
            let mut events = orchestrator.subscribe();
            orchestrator.wait_until_active().await;

            let first = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(first, StepEvent::Activated { source: SourceKind::Primary, .. }));
            let second = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(second, StepEvent::TodayUpdated { steps: 2000, .. }));
            let third = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(third, StepEvent::GoalReached { steps: 2000, goal: 1000, .. }));
        }
    }

    #[tokio::test]
    async fn later_subscribers_only_see_new_events() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 10));
        let (orchestrator, _) = isolated(source, 10_000);
        let mut first = orchestrator.subscribe();
        orchestrator.set_goal(500);
        let mut second = orchestrator.subscribe();
        orchestrator.fetch_today_steps().await;

        assert!(matches!(first.recv().await.unwrap(), StepEvent::GoalChanged { goal: 500, .. }));
        assert!(matches!(first.recv().await.unwrap(), StepEvent::TodayUpdated { .. }));
        assert!(matches!(second.recv().await.unwrap(), StepEvent::TodayUpdated { .. }));
    }

    #[tokio::test]
    async fn fetch_today_reports_the_clock_day() {
        let clock = Arc::new(FixedClock::new(today()));
        let source = Arc::new(
            MapSource::new("map")
                .with_day(today(), 30)
                .with_day(today().next(), 40),
        );
        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings {
                enable_side_effects: false,
                initial_goal: 10_000,
            },
            source,
            Arc::new(RecordingSink::default()),
            clock.clone(),
        );

        assert_eq!(orchestrator.fetch_today().await, (today(), 30));
        clock.advance(1);
        assert_eq!(orchestrator.fetch_today().await, (today().next(), 40));
    }

    #[tokio::test]
    async fn snapshot_serializes_weekly_map_by_date() {
        let source = Arc::new(MapSource::new("map").with_day(today(), 3456));
        let (orchestrator, _) = isolated(source, 10_000);
        orchestrator.fetch_today_steps().await;

        let json = serde_json::to_value(orchestrator.snapshot()).unwrap();
        assert_eq!(json["today_steps"], 3456);
        assert_eq!(json["weekly_steps"]["2025-09-05"], 3456);
        assert_eq!(json["is_updating"], false);
    }
}
