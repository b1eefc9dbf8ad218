//! Configuration module for the podcast pipeline.
//!
//! Handles loading settings, the episode directory layout and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, CONTEXT_PROMPT};
pub use settings::{
    AgentSettings, GeneralSettings, PathSettings, PromptSettings, Settings,
    TranscriptionProvider, TranscriptionSettings, CLI_PATH_ENV, LOCAL_CONFIG_FILE,
};
