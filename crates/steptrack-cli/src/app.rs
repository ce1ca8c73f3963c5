//! Composition root: concrete sources, sink and orchestrator from config.

use std::sync::Arc;
use std::time::Duration;

use steptrack_core::notify::NotificationSink;
use steptrack_core::storage::GOAL_RANGE;
use steptrack_core::{
    Clock, Config, OrchestratorSettings, PedometerFeed, PedometerSource, ResolvingSource,
    SampleStoreSource, StepOrchestrator, SystemClock,
};

pub struct App {
    pub orchestrator: Arc<StepOrchestrator>,
    pub source: Arc<ResolvingSource>,
    pub pedometer: PedometerFeed,
}

pub struct AppOptions {
    pub goal: Option<i64>,
    pub side_effects: bool,
    pub fallback_only: bool,
}

impl App {
    pub fn build(
        config: &Config,
        options: AppOptions,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let goal = match options.goal {
            Some(goal) if !GOAL_RANGE.contains(&goal) => {
                return Err(format!(
                    "goal {goal} is outside {}..={}",
                    GOAL_RANGE.start(),
                    GOAL_RANGE.end()
                )
                .into());
            }
            Some(goal) => goal,
            None => config.goal.default_steps,
        };

        let primary = Arc::new(SampleStoreSource::new(
            config.sample_db_path()?,
            Duration::from_secs(config.source.poll_interval_secs),
        ));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let pedometer = PedometerSource::new(config.source.pedometer_available)
            .with_clock(Arc::clone(&clock));
        let feed = pedometer.feed();

        let mut source = ResolvingSource::new(primary, Arc::new(pedometer));
        if options.fallback_only || !config.source.prefer_primary {
            source = source.fallback_only();
        }
        let source = Arc::new(source);

        let orchestrator = StepOrchestrator::new(
            OrchestratorSettings {
                enable_side_effects: options.side_effects,
                initial_goal: goal,
            },
            source.clone(),
            notifier,
            clock,
        );

        Ok(Self {
            orchestrator,
            source,
            pedometer: feed,
        })
    }
}
