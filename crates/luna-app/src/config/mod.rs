use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use luna_logging::DEFAULT_LOG_CAPACITY;
use luna_reminders::DEFAULT_OFFSETS_MINUTES;
use luna_settings::get_luna_dir;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Optional user configuration read from `~/.luna-villa/config.toml`.
///
/// Every field has a default, so a missing file or a partial one is fine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Server used when nothing was saved with `luna server`
    pub server_url: Option<String>,
    /// Minutes-before offsets for `luna remind` when none are given
    pub reminder_offsets: Vec<i64>,
    pub log_capacity: usize,
    pub log_level: String,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            reminder_offsets: DEFAULT_OFFSETS_MINUTES.to_vec(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_level: "warn".to_string(),
            verbose: false,
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid config file")
    }

    /// Load the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to load {}", path.display()))
    }
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_luna_dir()?.join(CONFIG_FILE_NAME))
}

/// Location of the persisted settings (token, server URL, debug overrides)
pub fn settings_path() -> Result<PathBuf> {
    Ok(get_luna_dir()?.join(SETTINGS_FILE_NAME))
}
