use std::sync::Arc;

use serde::Serialize;
use steptrack_core::stats::{self, WeeklySummary};
use steptrack_core::{Config, SourceKind, StepSource, WeeklyMap};

use crate::app::{App, AppOptions};
use crate::notifier::ConsoleNotifier;

#[derive(Serialize)]
struct WeekReport {
    source: SourceKind,
    days: WeeklyMap,
    summary: WeeklySummary,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let app = App::build(
        &config,
        AppOptions {
            goal: None,
            side_effects: false,
            fallback_only: false,
        },
        Arc::new(ConsoleNotifier::muted()),
    )?;

    let source = app.source.activate().await?;
    app.orchestrator.load_weekly_data().wait().await;
    let days = app.orchestrator.weekly_steps();

    let report = WeekReport {
        source,
        summary: stats::summarize(&days),
        days,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
