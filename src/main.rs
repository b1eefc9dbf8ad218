//! podcast-agents CLI entry point.

use anyhow::Result;
use clap::Parser;
use podcast_agents::cli::{commands, until_cancelled, Cli, Commands, CANCELLED_EXIT_CODE};
use podcast_agents::config::Settings;
use podcast_agents::logging;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The hook answers on stdout and must never fail without a decision.
    if matches!(cli.command, Some(Commands::Hook)) {
        std::process::exit(commands::run_hook(cli.config.as_deref(), cli.verbose));
    }

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = match &config_path {
        Some(path) => Settings::load_from(Some(path))?,
        None => Settings::load()?,
    };

    let log_path = logging::init_logging(&settings, cli.verbose, true)?;
    tracing::debug!("Logging to {}", log_path.display());

    // Execute command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            // Prompts block on stdin, so cancellation has to come from outside the task.
            tokio::spawn(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    println!("\n\nCancelled by user");
                    std::process::exit(CANCELLED_EXIT_CODE);
                }
            });
            commands::run_workflow(settings, config_path.as_deref()).await?;
        }

        Commands::Transcribe { number } => {
            let ctrl_c = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            match until_cancelled(commands::run_transcribe(&number, &settings), ctrl_c).await {
                Some(result) => result?,
                None => {
                    println!("\n\nCancelled by user");
                    std::process::exit(CANCELLED_EXIT_CODE);
                }
            }
        }

        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, &settings, cli.config.as_deref())?;
        }

        Commands::Hook => unreachable!("handled before logging is initialized"),
    }

    Ok(())
}
