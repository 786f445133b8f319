//! Huddle CLI: the main entry point.
//!
//! Commands:
//! - `run`: process every log file with the incident-response chat
//! - `config show`: print the effective configuration (keys redacted)
//! - `config init`: write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "huddle",
    about = "Huddle: multi-agent incident response over your log files",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the group chat over every log file
    Run {
        /// Directory of pristine sample logs to stage
        #[arg(long)]
        source: Option<PathBuf>,

        /// Directory the logs are staged into and processed from
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Turn ceiling per log file
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Skip the pause before each log file
        #[arg(long)]
        no_delay: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            source,
            work_dir,
            max_iterations,
            no_delay,
        } => {
            commands::run::run(commands::run::RunOptions {
                source,
                work_dir,
                max_iterations,
                no_delay,
            })
            .await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
