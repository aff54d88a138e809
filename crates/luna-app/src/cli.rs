use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use luna_types::DEFAULT_HISTORY_LIMIT;

/// CLI arguments for luna
#[derive(Parser, Debug)]
#[command(name = "luna")]
#[command(about = "Luna Villa - chat with Luna and manage memos, tasks and reminders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this server for the current run instead of the saved one
    #[arg(long, global = true, value_name = "URL", env = "LUNA_SERVER_URL")]
    pub server_url: Option<String>,

    /// Path to the config file (default: ~/.luna-villa/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "LUNA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level for diagnostics (trace, debug, info, warn, error, off)
    #[arg(long, global = true, value_name = "LEVEL", env = "LUNA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable verbose debug output (shows HTTP requests and stream lines)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with the villa password
    Login {
        /// Password; prompted for when omitted
        #[arg(env = "LUNA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the saved token
    Logout,
    /// Show or change the server URL
    Server {
        /// New server address, e.g. 192.168.0.10:8000
        url: Option<String>,
    },
    /// Talk to Luna; starts an interactive session when no message is given
    Chat {
        /// Message to send
        message: Option<String>,
        /// Image file to attach (repeatable)
        #[arg(short = 'i', long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Show recent conversation history
    History {
        #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
    /// Conversation counters and affinity
    Stats,
    /// Manage memos
    Memos {
        #[command(subcommand)]
        command: Option<MemoCommands>,
    },
    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: Option<TaskCommands>,
    },
    /// Manage calendar events
    Events {
        #[command(subcommand)]
        command: Option<EventCommands>,
    },
    /// Plan local reminders
    Remind {
        #[command(subcommand)]
        command: RemindCommands,
    },
    /// Debug overrides
    Debug {
        #[command(subcommand)]
        command: Option<DebugCommands>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemoCommands {
    /// List memos, newest first
    List,
    /// Save a new memo
    Add {
        content: String,
        #[arg(short = 't', long, default_value = "")]
        title: String,
    },
    /// Delete a memo
    Delete { id: i64 },
    /// Push a memo to the PC sync folder
    Sync { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Only tasks due on this date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: Option<String>,
        /// Include finished tasks
        #[arg(short = 'a', long)]
        all: bool,
    },
    /// Add a task
    Add {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: Option<String>,
        /// Due time (HH:MM)
        #[arg(short = 't', long)]
        time: Option<String>,
    },
    /// Mark a task as done
    Done { id: i64 },
    /// Delete a task
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// List events for a month, or upcoming ones
    List {
        #[arg(long, requires = "month")]
        year: Option<i32>,
        #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Add an event
    Add {
        title: String,
        /// Start time (YYYY-MM-DDTHH:MM)
        start_at: String,
        #[arg(long)]
        end_at: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete an event
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum RemindCommands {
    /// Show the reminders that would be scheduled for one item
    Plan {
        /// Id of the task or event
        id: i64,
        title: String,
        /// Target time: RFC 3339, or local "YYYY-MM-DD HH:MM"
        at: String,
        /// Minutes before the target (repeatable); defaults from config
        #[arg(short = 'o', long = "offset", allow_negative_numbers = true)]
        offsets: Vec<i64>,
    },
    /// Plan reminders for every open task with a due time
    Tasks {
        #[arg(short = 'd', long)]
        date: Option<String>,
    },
    /// Fire a test notification
    Test,
}

#[derive(Subcommand, Debug)]
pub enum DebugCommands {
    /// Show debug state and the effective hour
    Show,
    Enable,
    Disable,
    /// Set the virtual hour (0-23); clears it when omitted
    Hour {
        #[arg(value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,
    },
    /// Override the displayed affinity level; clears it when omitted
    Affinity { level: Option<u32> },
    /// Upload this session's buffered logs
    SendLogs,
}
