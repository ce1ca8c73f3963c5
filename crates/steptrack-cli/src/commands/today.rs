use std::sync::Arc;

use serde::Serialize;
use steptrack_core::{Config, DayKey, SourceKind, StepCount, StepSource};

use crate::app::{App, AppOptions};
use crate::notifier::ConsoleNotifier;

#[derive(Serialize)]
pub struct TodayReport {
    pub day: DayKey,
    pub steps: StepCount,
    pub goal: i64,
    pub progress: f64,
    pub source: SourceKind,
}

/// Fetch today through an activated app and describe the result.
pub async fn report(app: &App) -> Result<TodayReport, Box<dyn std::error::Error>> {
    let source = app.source.activate().await?;
    let (day, steps) = app.orchestrator.fetch_today().await;
    Ok(TodayReport {
        day,
        steps,
        goal: app.orchestrator.goal_steps(),
        progress: app.orchestrator.progress(),
        source,
    })
}

pub async fn run(goal: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let app = App::build(
        &config,
        AppOptions {
            goal,
            side_effects: false,
            fallback_only: false,
        },
        Arc::new(ConsoleNotifier::muted()),
    )?;

    let today = report(&app).await?;
    println!("{}", serde_json::to_string_pretty(&today)?);
    Ok(())
}
