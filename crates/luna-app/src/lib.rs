//! `luna` command-line client for Luna Villa.

pub mod app;
pub mod cli;
pub mod config;

pub use app::{run_command, setup_from_cli, AppContext, AppSetup};
pub use cli::{Cli, Commands};
pub use config::AppConfig;
