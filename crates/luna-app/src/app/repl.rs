use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use luna_settings::{current_hour, SystemClock};

use super::commands::ConsoleChat;
use super::AppContext;

/// Greeting for the hour of day
fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=10 => "Good morning ♡",
        11..=16 => "Welcome back ♡",
        17..=21 => "Good evening ♡",
        _ => "Still up? ♡",
    }
}

/// Run an interactive chat session.
///
/// `images` are attached to the first message only.
pub async fn run_repl_mode(ctx: &AppContext, mut images: Vec<String>) -> Result<()> {
    let hour = current_hour(&SystemClock, &ctx.debug)?;
    println!("{}", format!("🌙 Luna Villa - {}", greeting(hour)).bright_magenta().bold());
    println!("{}", format!("Server: {}", ctx.client.server_url()).bright_black());
    if !ctx.client.is_authenticated() {
        println!("{}", "Not logged in; run `luna login` first if the server asks.".yellow());
    }
    println!(
        "{}",
        "Type 'exit' or 'quit' to leave, '/logs' to upload diagnostics\n".bright_black()
    );

    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline(&format!("{} ", "you>".cyan().bold())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}", format!("Input error: {}", e).red());
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match input {
            "exit" | "quit" => break,
            "/logs" => {
                if ctx.client.send_logs(&ctx.logs).await {
                    println!("{}", "Logs sent".green());
                } else {
                    println!("{}", "No logs sent".yellow());
                }
                continue;
            }
            _ => {}
        }

        print!("{} ", "luna>".magenta().bold());
        let attachments = std::mem::take(&mut images);
        ctx.client.chat(input, &attachments, &mut ConsoleChat).await;
    }

    println!("{}", "See you soon ♡".bright_magenta());
    Ok(())
}
