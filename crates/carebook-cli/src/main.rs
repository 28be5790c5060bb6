mod cli;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use carebook_gateway::RecordGateway;
use carebook_gateway::config::loader::load_config;
use carebook_gateway::observability::init_tracing;
use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging.level);
    let gateway = RecordGateway::connect(&config).context("Failed to set up backend client")?;

    match cli.command {
        Commands::Patients(args) => commands::patients::run(&gateway, args.command, format).await?,
        Commands::History(args) => commands::history::run(&gateway, args.command, format).await?,
        Commands::Appointments(args) => {
            commands::appointments::run(&gateway, args.command, format).await?
        }
        Commands::Files(args) => commands::files::run(&gateway, args.command, format).await?,
    }

    Ok(())
}
