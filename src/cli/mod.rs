//! CLI module for podcast-agents.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_size, Output};

use clap::{Parser, Subcommand};
use std::future::Future;

/// Environment variable carrying the config path into agent-spawned processes.
pub const CONFIG_ENV: &str = "PODCAST_AGENTS_CONFIG";

/// Exit status after Ctrl-C (128 + SIGINT).
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Drive `task` until it completes or `cancel` fires.
///
/// On cancel the task is dropped in place, so its temp directories are removed
/// and child processes spawned with `kill_on_drop` are stopped before exit.
pub async fn until_cancelled<T>(
    task: impl Future<Output = T>,
    cancel: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        result = task => Some(result),
        _ = cancel => None,
    }
}

/// podcast-agents - Interactive podcast production with AI agents
///
/// Describe what you want done with an episode; a planner writes a TODO list,
/// and after your approval a master agent delegates transcription, transcript
/// cleanup, and review to specialized subagents.
#[derive(Parser, Debug)]
#[command(name = "podcast-agents")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase console verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<String>,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan and execute a production request interactively
    Run,

    /// Transcribe audio/<number>.wav into output/transcripts/<number>.txt
    Transcribe {
        /// Episode number (digits only)
        #[arg(short = 'n', long)]
        number: String,
    },

    /// PreToolUse hook entry point (reads hook JSON on stdin)
    #[command(hide = true)]
    Hook,

    /// Create the working directories and a project-local config file
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the path of the configuration file in use
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_until_cancelled_returns_finished_task() {
        let result = until_cancelled(async { 7 }, std::future::pending()).await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_cancel_drops_task_and_its_temp_dir() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let task = async move {
            let temp = tempfile::tempdir().unwrap();
            tx.send(temp.path().to_path_buf()).unwrap();
            std::future::pending::<()>().await;
            drop(temp);
        };
        let cancel = async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        };

        assert!(until_cancelled(task, cancel).await.is_none());
        let path = rx.await.unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["podcast-agents"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_transcribe_number_flags() {
        for args in [
            vec!["podcast-agents", "transcribe", "-n", "12"],
            vec!["podcast-agents", "transcribe", "--number", "12"],
            vec!["podcast-agents", "transcribe", "--number=12"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Some(Commands::Transcribe { number }) => assert_eq!(number, "12"),
                other => panic!("unexpected command: {:?}", other),
            }
        }
    }

    #[test]
    fn test_transcribe_requires_number() {
        assert!(Cli::try_parse_from(["podcast-agents", "transcribe"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["podcast-agents", "hook", "--config", "/tmp/p.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Hook)));
        assert_eq!(cli.config.as_deref(), Some("/tmp/p.toml"));
    }
}
