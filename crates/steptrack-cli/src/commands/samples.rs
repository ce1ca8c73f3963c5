use std::sync::Arc;

use chrono::{DateTime, Duration, Local};
use clap::Subcommand;
use steptrack_core::{Config, DayKey, SampleStore};

use super::today;
use crate::app::{App, AppOptions};
use crate::notifier::ConsoleNotifier;

#[derive(Subcommand)]
pub enum SamplesAction {
    /// Record a step sample in the sample store
    Add {
        /// Steps in the sample
        count: u64,
        /// End of the sample (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// Sample length in minutes, counted back from --at
        #[arg(long, default_value = "0")]
        minutes: i64,
        /// Recorder that produced the sample
        #[arg(long, default_value = "cli")]
        origin: String,
    },
    /// List today's samples as JSON
    List,
    /// Feed pedometer deltas through the fallback source and report today
    Pedometer {
        /// Step deltas, applied in order
        deltas: Vec<u64>,
    },
}

pub async fn run(action: SamplesAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        SamplesAction::Add {
            count,
            at,
            minutes,
            origin,
        } => {
            if minutes < 0 {
                return Err("--minutes must not be negative".into());
            }
            let end: DateTime<Local> = match at {
                Some(at) => DateTime::parse_from_rfc3339(&at)?.with_timezone(&Local),
                None => Local::now(),
            };
            let start = end - Duration::minutes(minutes);
            let store = SampleStore::open(&config.sample_db_path()?)?;
            let id = store.record_sample(&start, &end, count, &origin)?;
            println!("{}", serde_json::json!({ "id": id, "day": DayKey::from_instant(&start) }));
        }
        SamplesAction::List => {
            let store = SampleStore::open(&config.sample_db_path()?)?;
            let day = DayKey::today();
            let samples = store.samples_between(day.start().timestamp(), day.end().timestamp())?;
            println!("{}", serde_json::to_string_pretty(&samples)?);
        }
        SamplesAction::Pedometer { deltas } => {
            let app = App::build(
                &config,
                AppOptions {
                    goal: None,
                    side_effects: false,
                    fallback_only: true,
                },
                Arc::new(ConsoleNotifier::muted()),
            )?;
            for delta in deltas {
                app.pedometer.record(&Local::now(), delta);
            }
            let report = today::report(&app).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
