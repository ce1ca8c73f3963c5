mod config;
pub mod samples;

pub use config::{Config, GoalConfig, NotificationsConfig, SourceConfig, GOAL_RANGE};
pub use samples::{SampleRecord, SampleStore};

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Returns the steptrack data directory.
///
/// `STEPTRACK_DATA_DIR` wins when set; otherwise `~/.config/steptrack[-dev]/`
/// based on STEPTRACK_ENV (set STEPTRACK_ENV=dev for the development dir).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STEPTRACK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("STEPTRACK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("steptrack-dev")
            } else {
                base_dir.join("steptrack")
            }
        }
    };

    ensure_dir(&dir)
}

fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}
