use anyhow::{Context, Result};
use std::sync::Arc;

use luna_api::ApiClient;
use luna_logging::LogBuffer;
use luna_settings::{DebugSettings, JsonFileStore, SettingsStore};
use luna_types::keys;

use crate::cli::Cli;
use crate::config::{default_config_path, settings_path, AppConfig};

pub mod commands;
pub mod remind;
pub mod repl;

pub use commands::{encode_images, run_command};
pub use remind::{parse_target, plan_reminders};
pub use repl::run_repl_mode;

/// Everything a command needs: the API client, persisted settings and the
/// session's log buffer.
pub struct AppContext {
    pub client: ApiClient,
    pub store: Arc<dyn SettingsStore>,
    pub debug: DebugSettings,
    pub config: AppConfig,
    pub logs: LogBuffer,
}

impl AppContext {
    pub fn new(store: Arc<dyn SettingsStore>, config: AppConfig, logs: LogBuffer) -> Result<Self> {
        let client = ApiClient::new(store.clone())
            .context("Failed to build HTTP client")?
            .with_verbose(config.verbose);
        Ok(Self {
            client,
            debug: DebugSettings::new(store.clone()),
            store,
            config,
            logs,
        })
    }
}

/// Resolved startup state for the binary
pub struct AppSetup {
    pub context: AppContext,
}

/// Load config and settings, install the logger and build the context
pub fn setup_from_cli(cli: &Cli) -> Result<AppSetup> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = AppConfig::load(&config_path)?;
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    let logs = LogBuffer::new(config.log_capacity);
    luna_logging::init_logging(logs.clone(), &config.log_level)?;

    let settings = settings_path()?;
    let store: Arc<dyn SettingsStore> = Arc::new(
        JsonFileStore::open(&settings)
            .with_context(|| format!("Failed to open settings at {}", settings.display()))?,
    );

    // Saved server wins over the config file; the CLI flag wins over both
    // but is not persisted.
    let context = AppContext::new(store, config, logs)?;
    if let Some(url) = &cli.server_url {
        context.client.use_server_url(url);
    } else if context.store.get(keys::SERVER_URL)?.is_none() {
        if let Some(url) = &context.config.server_url {
            context.client.use_server_url(url);
        }
    }
    log::debug!("Using server {}", context.client.server_url());

    Ok(AppSetup { context })
}
