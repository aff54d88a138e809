use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::CommandFactory;
use colored::Colorize;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use luna_api::{ChatCallbacks, ChatHandler};
use luna_reminders::{InMemoryNotificationCenter, ReminderRequest, ReminderScheduler};
use luna_settings::{current_hour, Clock, SystemClock};
use luna_types::{LoginResult, NewEvent, NewTask, TaskUpdate};

use super::remind::{format_plan, parse_target, plan_reminders};
use super::repl::run_repl_mode;
use super::AppContext;
use crate::cli::{
    Cli, Commands, DebugCommands, EventCommands, MemoCommands, RemindCommands, TaskCommands,
};

/// Read image files and base64-encode them for the chat request
pub fn encode_images(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            Ok(STANDARD.encode(bytes))
        })
        .collect()
}

/// Prints streamed chat chunks straight to the terminal
pub struct ConsoleChat;

impl ChatHandler for ConsoleChat {
    fn on_chunk(&mut self, chunk: &str) {
        print!("{}", chunk.bright_magenta());
        let _ = std::io::stdout().flush();
    }

    fn on_done(&mut self) {
        println!();
    }

    fn on_error(&mut self, message: &str) {
        println!();
        eprintln!("{}", message.red());
    }
}

/// Execute a subcommand and return the text to print
pub async fn run_command(command: &Commands, ctx: &AppContext) -> Result<String> {
    match command {
        Commands::Login { password } => {
            let password = match password {
                Some(p) => p.clone(),
                None => DefaultEditor::new()?.readline("Password: ")?,
            };
            match ctx.client.login(password.trim()).await {
                LoginResult::Success => Ok("Welcome home ♡".green().to_string()),
                LoginResult::WrongPassword => bail!("Wrong password"),
                LoginResult::NetworkError => bail!(luna_api::CONNECTIVITY_MESSAGE),
            }
        }
        Commands::Logout => {
            ctx.client.logout()?;
            Ok("Logged out".to_string())
        }
        Commands::Server { url } => {
            if let Some(url) = url {
                ctx.client.set_server_url(url)?;
            }
            Ok(ctx.client.server_url())
        }
        Commands::Chat { message, images } => {
            let images = encode_images(images)?;
            match message {
                Some(message) => {
                    // Terminal callbacks print as they go; the failure is
                    // surfaced through the exit status too.
                    let mut failed = None;
                    {
                        let mut handler = ChatCallbacks {
                            on_chunk: |chunk: &str| ConsoleChat.on_chunk(chunk),
                            on_done: || ConsoleChat.on_done(),
                            on_error: |message: &str| failed = Some(message.to_string()),
                        };
                        ctx.client.chat(message, &images, &mut handler).await;
                    }
                    match failed {
                        Some(message) => bail!(message),
                        None => Ok(String::new()),
                    }
                }
                None => {
                    run_repl_mode(ctx, images).await?;
                    Ok(String::new())
                }
            }
        }
        Commands::History { limit } => {
            let history = ctx.client.history(*limit).await?;
            Ok(history
                .iter()
                .map(|m| {
                    let who = if m.role == "user" {
                        "you".cyan()
                    } else {
                        "luna".magenta()
                    };
                    format!("{}: {}", who, m.content)
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Commands::Stats => {
            let stats = ctx.client.stats().await?;
            let mut level = stats.affinity.level;
            if ctx.debug.is_enabled()? {
                if let Some(forced) = ctx.debug.affinity_override()? {
                    level = i64::from(forced);
                }
            }
            Ok(format!(
                "Messages: {} (you {}, luna {})\nAffinity: Lv.{} {} ({} exp)",
                stats.total_messages,
                stats.user_messages,
                stats.luna_messages,
                level,
                stats.affinity.rank,
                stats.affinity.exp
            ))
        }
        Commands::Memos { command } => run_memo_command(command.as_ref(), ctx).await,
        Commands::Tasks { command } => run_task_command(command.as_ref(), ctx).await,
        Commands::Events { command } => run_event_command(command.as_ref(), ctx).await,
        Commands::Remind { command } => run_remind_command(command, ctx).await,
        Commands::Debug { command } => run_debug_command(command.as_ref(), ctx).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let mut out = Vec::new();
            clap_complete::generate(*shell, &mut cmd, "luna", &mut out);
            Ok(String::from_utf8(out)?)
        }
    }
}

async fn run_memo_command(command: Option<&MemoCommands>, ctx: &AppContext) -> Result<String> {
    match command.unwrap_or(&MemoCommands::List) {
        MemoCommands::List => {
            let memos = ctx.client.memos().await?;
            if memos.is_empty() {
                return Ok("No memos yet".to_string());
            }
            Ok(memos
                .iter()
                .map(|m| {
                    let title = if m.title.is_empty() {
                        String::new()
                    } else {
                        format!("{} ", m.title.bold())
                    };
                    format!("#{} {}{}", m.id, title, m.content)
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        MemoCommands::Add { content, title } => {
            let ack = ctx.client.save_memo(content, title).await?;
            Ok(ack_text(ack.message, "Memo saved"))
        }
        MemoCommands::Delete { id } => {
            let ack = ctx.client.delete_memo(*id).await?;
            Ok(ack_text(ack.message, "Memo deleted"))
        }
        MemoCommands::Sync { id } => {
            let ack = ctx.client.sync_memo_to_pc(*id).await?;
            Ok(ack_text(ack.message, "Memo synced"))
        }
    }
}

async fn run_task_command(command: Option<&TaskCommands>, ctx: &AppContext) -> Result<String> {
    let default = TaskCommands::List {
        date: None,
        all: false,
    };
    match command.unwrap_or(&default) {
        TaskCommands::List { date, all } => {
            let tasks = ctx.client.tasks(date.as_deref(), *all).await?;
            if tasks.is_empty() {
                return Ok("Nothing to do".to_string());
            }
            Ok(tasks
                .iter()
                .map(|t| {
                    let mark = if t.is_done { "[x]" } else { "[ ]" };
                    let due = match (&t.due_date, &t.due_time) {
                        (Some(d), Some(tm)) => format!(" ({} {})", d, tm),
                        (Some(d), None) => format!(" ({})", d),
                        _ => String::new(),
                    };
                    format!("{} #{} {}{}", mark, t.id, t.title, due.dimmed())
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        TaskCommands::Add { title, date, time } => {
            let ack = ctx
                .client
                .create_task(&NewTask {
                    title: title.clone(),
                    event_id: None,
                    due_date: date.clone(),
                    due_time: time.clone(),
                })
                .await?;
            Ok(ack_text(ack.message, "Task added"))
        }
        TaskCommands::Done { id } => {
            let update = TaskUpdate {
                is_done: Some(true),
                ..Default::default()
            };
            let ack = ctx.client.update_task(*id, &update).await?;
            Ok(ack_text(ack.message, "Task done"))
        }
        TaskCommands::Delete { id } => {
            let ack = ctx.client.delete_task(*id).await?;
            Ok(ack_text(ack.message, "Task deleted"))
        }
    }
}

async fn run_event_command(command: Option<&EventCommands>, ctx: &AppContext) -> Result<String> {
    let default = EventCommands::List {
        year: None,
        month: None,
    };
    match command.unwrap_or(&default) {
        EventCommands::List { year, month } => {
            let events = ctx.client.events(*year, *month).await?;
            if events.is_empty() {
                return Ok("No events".to_string());
            }
            Ok(events
                .iter()
                .map(|e| format!("#{} {}  {}", e.id, e.start_at.dimmed(), e.title))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        EventCommands::Add {
            title,
            start_at,
            end_at,
            description,
        } => {
            let ack = ctx
                .client
                .create_event(&NewEvent {
                    title: title.clone(),
                    description: description.clone(),
                    start_at: start_at.clone(),
                    end_at: end_at.clone(),
                    added_by: "user".to_string(),
                })
                .await?;
            Ok(ack_text(ack.message, "Event added"))
        }
        EventCommands::Delete { id } => {
            let ack = ctx.client.delete_event(*id).await?;
            Ok(ack_text(ack.message, "Event deleted"))
        }
    }
}

async fn run_remind_command(command: &RemindCommands, ctx: &AppContext) -> Result<String> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    match command {
        RemindCommands::Plan {
            id,
            title,
            at,
            offsets,
        } => {
            let offsets = if offsets.is_empty() {
                ctx.config.reminder_offsets.clone()
            } else {
                offsets.clone()
            };
            let request = ReminderRequest::new(*id, title.clone(), parse_target(at)?, offsets);
            let plan = plan_reminders(&[request], clock).await?;
            Ok(format_plan(&plan))
        }
        RemindCommands::Tasks { date } => {
            let tasks = ctx.client.tasks(date.as_deref(), false).await?;
            let requests: Vec<_> = tasks
                .iter()
                .filter_map(|t| {
                    ReminderRequest::from_local(
                        t.id,
                        t.title.clone(),
                        t.due_at()?,
                        ctx.config.reminder_offsets.clone(),
                    )
                })
                .collect();
            log::debug!("{} of {} tasks have a due time", requests.len(), tasks.len());
            let plan = plan_reminders(&requests, clock).await?;
            Ok(format_plan(&plan))
        }
        RemindCommands::Test => {
            let center = Arc::new(InMemoryNotificationCenter::new());
            let scheduler = ReminderScheduler::new(center.clone(), clock);
            scheduler.schedule_test_notification().await?;
            Ok(center
                .delivered()
                .iter()
                .map(|n| format!("{}\n{}", n.content.title.bold(), n.content.body))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

async fn run_debug_command(command: Option<&DebugCommands>, ctx: &AppContext) -> Result<String> {
    let debug = &ctx.debug;
    match command.unwrap_or(&DebugCommands::Show) {
        DebugCommands::Show => {}
        DebugCommands::Enable => debug.set_enabled(true)?,
        DebugCommands::Disable => debug.set_enabled(false)?,
        DebugCommands::Hour { hour } => debug.set_virtual_hour(*hour)?,
        DebugCommands::Affinity { level } => debug.set_affinity_override(*level)?,
        DebugCommands::SendLogs => {
            return if ctx.client.send_logs(&ctx.logs).await {
                Ok("Logs sent".to_string())
            } else {
                bail!("No logs sent (buffer empty or server unreachable)")
            };
        }
    }

    let show = |value: Option<u32>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    Ok(format!(
        "Debug: {}\nVirtual hour: {}\nAffinity override: {}\nCurrent hour: {}",
        if debug.is_enabled()? { "on" } else { "off" },
        show(debug.virtual_hour()?),
        show(debug.affinity_override()?),
        current_hour(&SystemClock, debug)?
    ))
}

fn ack_text(message: Option<String>, fallback: &str) -> String {
    message.unwrap_or_else(|| fallback.to_string())
}
