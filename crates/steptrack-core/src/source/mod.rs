//! Day-level step sources.
//!
//! A [`StepSource`] answers one question: how many steps were taken on a given
//! calendar day. Two backends exist, a primary one reading recorded samples
//! and a fallback one counting live pedometer deltas. [`ResolvingSource`]
//! picks between them once per session.

mod pedometer;
mod primary;
mod resolver;

pub use pedometer::{PedometerFeed, PedometerSource};
pub use primary::SampleStoreSource;
pub use resolver::{resolve, ResolvedSource, ResolvingSource};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::day::{DayKey, StepCount};
use crate::error::SourceError;

/// Which backend ended up serving step counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Primary,
    Fallback,
}

/// Capability to report the step count for a calendar day.
///
/// `steps_for_day` never fails: unavailable, unauthorized or empty backends
/// all report 0.
#[async_trait]
pub trait StepSource: Send + Sync {
    /// Short identifier used in logs (e.g. "samples", "pedometer").
    fn name(&self) -> &str;

    /// Total steps for `day`. Future days are not rejected.
    async fn steps_for_day(&self, day: DayKey) -> StepCount;

    /// One-time authorization / availability check.
    ///
    /// Returns the kind of backend that will serve counts.
    async fn activate(&self) -> Result<SourceKind, SourceError> {
        Ok(SourceKind::Primary)
    }

    /// Revision counter that ticks whenever the backend observes new data.
    ///
    /// Only meaningful after `activate`. `None` means the source cannot push.
    fn changes(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}
