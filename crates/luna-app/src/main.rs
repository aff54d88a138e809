use anyhow::Result;
use clap::Parser;

use luna_app::{run_command, setup_from_cli, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let setup = setup_from_cli(&cli)?;

    let output = run_command(&cli.command, &setup.context).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
