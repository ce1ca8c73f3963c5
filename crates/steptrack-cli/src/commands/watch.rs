use std::sync::Arc;

use steptrack_core::Config;
use tokio::sync::broadcast::error::RecvError;

use crate::app::{App, AppOptions};
use crate::notifier::ConsoleNotifier;

pub async fn run(goal: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let notifier = Arc::new(ConsoleNotifier::from_config(&config));
    let app = App::build(
        &config,
        AppOptions {
            goal,
            side_effects: true,
            fallback_only: false,
        },
        notifier,
    )?;

    let mut events = app.orchestrator.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event consumer fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => break,
        }
    }

    println!("{}", serde_json::to_string(&app.orchestrator.snapshot())?);
    Ok(())
}
