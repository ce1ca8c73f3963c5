//! SQLite-based step sample storage.
//!
//! Each row is one reading from an activity recorder: a count of steps taken
//! between `start_ts` and `end_ts` (unix seconds). Day totals are cumulative
//! sums over samples whose start falls inside the day.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::day::StepCount;
use crate::error::{DatabaseError, SourceError};

const SOURCE_NAME: &str = "samples";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub id: i64,
    pub start_ts: i64,
    pub end_ts: i64,
    pub count: StepCount,
    pub origin: String,
}

/// SQLite store of step samples.
pub struct SampleStore {
    conn: Connection,
}

impl SampleStore {
    /// Default location: `<data dir>/samples.db`.
    pub fn default_path() -> crate::error::Result<PathBuf> {
        Ok(data_dir()?.join("samples.db"))
    }

    /// Open (creating if needed) the store at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an existing store without creating anything.
    ///
    /// This is the read-access check for the primary source: a missing file is
    /// `Unavailable`, a file we cannot open or that lacks the sample table is
    /// `Denied`.
    pub fn open_existing(path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::Unavailable(SOURCE_NAME.to_string()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE).map_err(
            |e| SourceError::Denied {
                source_name: SOURCE_NAME.to_string(),
                reason: e.to_string(),
            },
        )?;
        let store = Self { conn };
        if !store.has_schema()? {
            return Err(SourceError::Denied {
                source_name: SOURCE_NAME.to_string(),
                reason: format!("{} has no step_samples table", path.display()),
            });
        }
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS step_samples (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                start_ts  INTEGER NOT NULL,
                end_ts    INTEGER NOT NULL,
                count     INTEGER NOT NULL CHECK (count >= 0),
                origin    TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_step_samples_start ON step_samples(start_ts);",
        )
    }

    fn has_schema(&self) -> Result<bool, rusqlite::Error> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'step_samples'",
            [],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// Append one sample.
    ///
    /// # Errors
    /// Rejects samples that end before they start; otherwise fails only if
    /// the insert fails.
    pub fn record_sample<Tz: TimeZone>(
        &self,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
        count: StepCount,
        origin: &str,
    ) -> Result<i64, SourceError> {
        if end < start {
            return Err(SourceError::InvalidSample(format!(
                "end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        let count = i64::try_from(count)
            .map_err(|_| SourceError::InvalidSample(format!("count {count} is too large")))?;
        self.conn.execute(
            "INSERT INTO step_samples (start_ts, end_ts, count, origin)
             VALUES (?1, ?2, ?3, ?4)",
            params![start.timestamp(), end.timestamp(), count, origin],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Cumulative steps over samples starting in `[start_ts, end_ts)`.
    pub fn steps_between(&self, start_ts: i64, end_ts: i64) -> Result<StepCount, DatabaseError> {
        let sum: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM step_samples
             WHERE start_ts >= ?1 AND start_ts < ?2",
            params![start_ts, end_ts],
            |row| row.get(0),
        )?;
        Ok(sum.max(0) as StepCount)
    }

    /// Highest row id; grows whenever a sample is written.
    pub fn watermark(&self) -> Result<i64, DatabaseError> {
        let id: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM step_samples",
            [],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn samples_between(&self, start_ts: i64, end_ts: i64) -> Result<Vec<SampleRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_ts, end_ts, count, origin FROM step_samples
             WHERE start_ts >= ?1 AND start_ts < ?2
             ORDER BY start_ts, id",
        )?;
        let rows = stmt.query_map(params![start_ts, end_ts], |row| {
            Ok(SampleRecord {
                id: row.get(0)?,
                start_ts: row.get(1)?,
                end_ts: row.get(2)?,
                count: row.get::<_, i64>(3)?.max(0) as StepCount,
                origin: row.get(4)?,
            })
        })?;
        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }
}
