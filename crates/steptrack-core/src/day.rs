//! Calendar-day keys in the local timezone.
//!
//! Every per-day step count is keyed by a [`DayKey`]. Two instants that fall
//! on the same local calendar date always normalize to the same key, and keys
//! order chronologically.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Steps counted on one day. Sources that cannot tell report 0.
pub type StepCount = u64;

/// Day-keyed step counts covering today and the six preceding days.
pub type WeeklyMap = BTreeMap<DayKey, StepCount>;

/// Start-of-local-day identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey {
    date: NaiveDate,
}

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Normalize any instant to the local calendar day that contains it.
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self {
            date: instant.with_timezone(&Local).date_naive(),
        }
    }

    pub fn today() -> Self {
        Self::from_instant(&Local::now())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The key `days` calendar days away (negative goes back in time).
    ///
    /// Saturates at the representable date range.
    pub fn offset(&self, days: i64) -> Self {
        self.date
            .checked_add_signed(Duration::days(days))
            .map(Self::from_date)
            .unwrap_or(*self)
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// First instant of this day in the local timezone.
    pub fn start(&self) -> DateTime<Local> {
        local_start_of(self.date)
    }

    /// Exclusive end of this day, i.e. the start of the next one.
    pub fn end(&self) -> DateTime<Local> {
        let next = self.next();
        if next == *self {
            return self.start() + Duration::days(1);
        }
        next.start()
    }

    /// Whether `instant` falls within `[start, end)`.
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        Self::from_instant(instant) == *self
    }

    /// The `count` most recent days ending at `ending`, newest first.
    pub fn recent(count: usize, ending: DayKey) -> Vec<DayKey> {
        (0..count as i64).map(|back| ending.offset(-back)).collect()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

fn local_start_of(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(start) = Local.from_local_datetime(&midnight).earliest() {
        return start;
    }
    // Midnight skipped by a DST transition: first valid quarter hour wins.
    (1..=96)
        .find_map(|quarter| {
            Local
                .from_local_datetime(&(midnight + Duration::minutes(15 * quarter)))
                .earliest()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

/// Source of "today" for the orchestrator.
pub trait Clock: Send + Sync {
    fn today(&self) -> DayKey;
}

/// Wall clock in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DayKey {
        DayKey::today()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    day: Mutex<DayKey>,
}

impl FixedClock {
    pub fn new(day: DayKey) -> Self {
        Self { day: Mutex::new(day) }
    }

    pub fn set(&self, day: DayKey) {
        *self.day.lock().unwrap_or_else(|e| e.into_inner()) = day;
    }

    pub fn advance(&self, days: i64) {
        let mut day = self.day.lock().unwrap_or_else(|e| e.into_inner());
        *day = day.offset(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DayKey {
        *self.day.lock().unwrap_or_else(|e| e.into_inner())
    }
}
