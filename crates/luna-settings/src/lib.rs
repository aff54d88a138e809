//! Persisted key-value settings, debug overrides and the clock capability.

pub mod clock;
pub mod debug;
pub mod store;

use std::path::PathBuf;

pub use clock::{hour_in, Clock, FixedClock, SystemClock, VirtualHourClock};
pub use debug::{current_hour, current_hour_in, DebugSettings};
pub use store::{JsonFileStore, MemoryStore, SettingsError, SettingsStore};

/// Name of the per-user data directory under `$HOME`
pub const APP_DIR_NAME: &str = ".luna-villa";

/// Get or create the base data directory (~/.luna-villa)
pub fn get_luna_dir() -> Result<PathBuf, SettingsError> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| SettingsError::NoHomeDir)?;

    let dir = PathBuf::from(home_dir).join(APP_DIR_NAME);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|source| SettingsError::Io {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(dir)
}
