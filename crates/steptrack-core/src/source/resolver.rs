//! One-time primary/fallback selection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, OnceCell};

use super::{SourceKind, StepSource};
use crate::day::{DayKey, StepCount};
use crate::error::SourceError;

/// Outcome of source selection.
#[derive(Clone)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    pub source: Arc<dyn StepSource>,
}

/// Try the primary backend; on any refusal degrade to the fallback.
///
/// The fallback is selected even when it is unavailable itself, in which case
/// every day reads as 0.
pub async fn resolve(primary: Arc<dyn StepSource>, fallback: Arc<dyn StepSource>) -> ResolvedSource {
    match primary.activate().await {
        Ok(_) => {
            tracing::info!(source = primary.name(), "primary step source authorized");
            ResolvedSource {
                kind: SourceKind::Primary,
                source: primary,
            }
        }
        Err(e) => {
            tracing::warn!(source = primary.name(), "primary step source refused, using fallback: {e}");
            activate_fallback(fallback).await
        }
    }
}

async fn activate_fallback(fallback: Arc<dyn StepSource>) -> ResolvedSource {
    if let Err(e) = fallback.activate().await {
        tracing::warn!(source = fallback.name(), "step counting is not available on this device: {e}");
    }
    ResolvedSource {
        kind: SourceKind::Fallback,
        source: fallback,
    }
}

/// A [`StepSource`] that performs selection on first use.
///
/// Selection runs once per instance. After degrading to the fallback the
/// primary is never probed again.
pub struct ResolvingSource {
    primary: Arc<dyn StepSource>,
    fallback: Arc<dyn StepSource>,
    prefer_primary: bool,
    resolved: OnceCell<ResolvedSource>,
}

impl ResolvingSource {
    pub fn new(primary: Arc<dyn StepSource>, fallback: Arc<dyn StepSource>) -> Self {
        Self {
            primary,
            fallback,
            prefer_primary: true,
            resolved: OnceCell::new(),
        }
    }

    /// Skip the primary probe entirely.
    pub fn fallback_only(mut self) -> Self {
        self.prefer_primary = false;
        self
    }

    pub async fn resolved(&self) -> &ResolvedSource {
        self.resolved
            .get_or_init(|| async {
                if self.prefer_primary {
                    resolve(Arc::clone(&self.primary), Arc::clone(&self.fallback)).await
                } else {
                    activate_fallback(Arc::clone(&self.fallback)).await
                }
            })
            .await
    }

    /// The selected backend kind, if selection already ran.
    pub fn kind(&self) -> Option<SourceKind> {
        self.resolved.get().map(|resolved| resolved.kind)
    }
}

#[async_trait]
impl StepSource for ResolvingSource {
    fn name(&self) -> &str {
        self.resolved
            .get()
            .map(|resolved| resolved.source.name())
            .unwrap_or("unresolved")
    }

    async fn steps_for_day(&self, day: DayKey) -> StepCount {
        self.resolved().await.source.steps_for_day(day).await
    }

    async fn activate(&self) -> Result<SourceKind, SourceError> {
        Ok(self.resolved().await.kind)
    }

    fn changes(&self) -> Option<watch::Receiver<u64>> {
        self.resolved.get().and_then(|resolved| resolved.source.changes())
    }
}
