//! Primary source: cumulative counts from the SQLite sample store.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{SourceKind, StepSource};
use crate::day::{DayKey, StepCount};
use crate::error::{DatabaseError, SourceError};
use crate::storage::SampleStore;

struct StoreHandle {
    store: Mutex<SampleStore>,
    revision: watch::Sender<u64>,
}

impl StoreHandle {
    fn new(store: SampleStore) -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            store: Mutex::new(store),
            revision,
        })
    }

    fn query<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&SampleStore) -> Result<T, DatabaseError>,
    {
        let store = self.store.lock().map_err(|_| DatabaseError::Locked)?;
        f(&store)
    }
}

/// Reads day totals from recorded step samples.
///
/// Access is granted by [`activate`](StepSource::activate) opening an existing
/// store. Until then, and if that fails, every day reads as 0.
pub struct SampleStoreSource {
    path: Option<PathBuf>,
    poll_interval: Duration,
    handle: OnceLock<Arc<StoreHandle>>,
    polling: AtomicBool,
}

impl SampleStoreSource {
    /// A source over the store at `path`, opened lazily on activation.
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: Some(path.into()),
            poll_interval,
            handle: OnceLock::new(),
            polling: AtomicBool::new(false),
        }
    }

    /// A source over an already opened store.
    pub fn with_store(store: SampleStore, poll_interval: Duration) -> Self {
        let handle = OnceLock::new();
        let _ = handle.set(StoreHandle::new(store));
        Self {
            path: None,
            poll_interval,
            handle,
            polling: AtomicBool::new(false),
        }
    }

    fn open(&self) -> Result<&Arc<StoreHandle>, SourceError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable(self.name().to_string()))?;
        let store = SampleStore::open_existing(path)?;
        Ok(self.handle.get_or_init(|| StoreHandle::new(store)))
    }

    fn start_polling(&self, handle: &Arc<StoreHandle>) {
        if self.polling.swap(true, Ordering::SeqCst) {
            return;
        }
        let weak = Arc::downgrade(handle);
        tokio::spawn(poll_watermark(weak, self.poll_interval));
    }
}

/// Ticks the revision counter whenever new samples land.
///
/// Stops once the owning source is dropped.
async fn poll_watermark(handle: Weak<StoreHandle>, interval: Duration) {
    let mut last_seen: Option<i64> = None;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(strong) = handle.upgrade() else {
            tracing::debug!("sample store dropped, stopping watermark poll");
            return;
        };
        let reader = Arc::clone(&strong);
        drop(strong);
        let watermark =
            tokio::task::spawn_blocking(move || reader.query(|store| store.watermark())).await;
        let watermark = match watermark {
            Ok(Ok(mark)) => mark,
            Ok(Err(e)) => {
                tracing::warn!("sample store watermark query failed: {e}");
                continue;
            }
            Err(e) => {
                tracing::warn!("sample store watermark task failed: {e}");
                continue;
            }
        };
        if last_seen.is_some_and(|seen| seen != watermark) {
            if let Some(strong) = handle.upgrade() {
                strong.revision.send_modify(|rev| *rev += 1);
            }
        }
        last_seen = Some(watermark);
    }
}

#[async_trait]
impl StepSource for SampleStoreSource {
    fn name(&self) -> &str {
        "samples"
    }

    async fn steps_for_day(&self, day: DayKey) -> StepCount {
        let Some(handle) = self.handle.get().cloned() else {
            tracing::debug!(%day, "sample store not authorized, reporting 0");
            return 0;
        };
        let (start, end) = (day.start().timestamp(), day.end().timestamp());
        let result =
            tokio::task::spawn_blocking(move || handle.query(|store| store.steps_between(start, end)))
                .await;
        match result {
            Ok(Ok(steps)) => steps,
            Ok(Err(e)) => {
                tracing::warn!(%day, "sample store query failed, reporting 0: {e}");
                0
            }
            Err(e) => {
                tracing::warn!(%day, "sample store query task failed, reporting 0: {e}");
                0
            }
        }
    }

    async fn activate(&self) -> Result<SourceKind, SourceError> {
        let handle = Arc::clone(self.open()?);
        self.start_polling(&handle);
        Ok(SourceKind::Primary)
    }

    fn changes(&self) -> Option<watch::Receiver<u64>> {
        self.handle.get().map(|handle| handle.revision.subscribe())
    }
}
