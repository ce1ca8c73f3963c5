//! # Steptrack Core Library
//!
//! This library provides the core logic for Steptrack, a daily step counter
//! with a goal. The CLI binary is a thin composition root over it: it picks the
//! concrete sources and notification sink, then drives the orchestrator.
//!
//! ## Architecture
//!
//! - **Day keys**: local start-of-day identifiers keying every per-day count
//! - **Step sources**: pluggable day-level backends (SQLite sample store as
//!   primary, live pedometer session as fallback) behind one async trait
//! - **Orchestrator**: owns today's count, the seven-day window and the goal;
//!   detects upward goal crossings
//! - **Aggregator**: pure average/total/best over a weekly snapshot
//! - **Storage**: TOML configuration and the sample store
//!
//! ## Key Components
//!
//! - [`StepOrchestrator`]: stateful core
//! - [`StepSource`]: trait every backend implements
//! - [`ResolvingSource`]: one-time primary/fallback selection
//! - [`NotificationSink`]: outgoing notification capability
//! - [`Config`]: application configuration management

pub mod day;
pub mod error;
pub mod events;
pub mod notify;
pub mod orchestrator;
pub mod source;
pub mod stats;
pub mod storage;

#[cfg(test)]
mod testing;

pub use day::{Clock, DayKey, FixedClock, StepCount, SystemClock, WeeklyMap};
pub use error::{ConfigError, CoreError, DatabaseError, SourceError};
pub use events::StepEvent;
pub use notify::{NotificationRequest, NotificationSink, Trigger};
pub use orchestrator::{
    goal_progress, OrchestratorSettings, OrchestratorState, Phase, StepOrchestrator, WeeklyLoad,
};
pub use source::{
    PedometerFeed, PedometerSource, ResolvedSource, ResolvingSource, SampleStoreSource,
    SourceKind, StepSource,
};
pub use stats::WeeklySummary;
pub use storage::{Config, SampleStore};
