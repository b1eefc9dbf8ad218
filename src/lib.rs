//! podcast-agents - Interactive podcast production with AI agents
//!
//! A CLI that turns a free-text production request ("transcribe episode 12
//! and clean it up") into a plan, asks for approval, and then has a master
//! agent carry the plan out through specialized subagents.
//!
//! # Overview
//!
//! - A planner agent writes a numbered TODO list into `output/plans/`
//! - The user approves or declines the plan
//! - A master agent delegates to `transcribe`, `modify` and `review` subagents
//! - A PreToolUse hook limits shell access to one transcription command
//!
//! # Architecture
//!
//! - `config` - Settings, directory layout and prompt templates
//! - `agent` - Agent definitions, the runtime CLI driver and the command hook
//! - `workflow` - Plan, approve, execute
//! - `transcription` - Speech-to-text with a pretrained Whisper model
//! - `audio` - ffmpeg helpers for format conversion and splitting
//! - `logging` - Console and per-run log file setup
//!
//! # Example
//!
//! ```rust,no_run
//! use podcast_agents::agent::ClaudeCliRunner;
//! use podcast_agents::config::Settings;
//! use podcast_agents::workflow::Workflow;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let runner = Arc::new(ClaudeCliRunner::new(&settings.agent.cli_path));
//!     let workflow = Workflow::new(settings, runner, "podcast-agents hook")?;
//!
//!     if let Some(plan) = workflow.plan("Transcribe episode 12").await? {
//!         println!("Plan written to {}", plan.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod openai;
pub mod transcription;
pub mod workflow;

pub use error::{PodcastError, Result};
