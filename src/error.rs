//! Error types for the podcast pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for podcast pipeline operations.
#[derive(Error, Debug)]
pub enum PodcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Agent runtime error: {0}")]
    AgentRuntime(String),

    #[error("Plan path is outside allowed directory: {}", .0.display())]
    PlanOutsideDirectory(PathBuf),

    #[error("Plan file not found at {}", .0.display())]
    PlanNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for podcast pipeline operations.
pub type Result<T> = std::result::Result<T, PodcastError>;
