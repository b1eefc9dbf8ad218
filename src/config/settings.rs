//! Configuration settings for the podcast pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local configuration file, checked before the user config.
pub const LOCAL_CONFIG_FILE: &str = "podcast-agents.toml";

/// Overrides `agent.cli_path`.
pub const CLI_PATH_ENV: &str = "CLAUDE_CLI_PATH";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub paths: PathSettings,
    pub agent: AgentSettings,
    pub transcription: TranscriptionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for run log files.
    pub log_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_dir: "./logs".to_string(),
            log_level: "debug".to_string(),
        }
    }
}

/// Directory layout for episode artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Raw episode audio, one `<number>.wav` per episode.
    pub audio_dir: String,
    /// Root of everything the agents produce.
    pub output_dir: String,
    /// Show notes, links and other material the reviewer may consult.
    pub episode_assets_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            audio_dir: "./audio".to_string(),
            output_dir: "./output".to_string(),
            episode_assets_dir: "./episode-assets".to_string(),
        }
    }
}

/// Settings for the hosted agent runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Path to the agent runtime CLI.
    pub cli_path: String,
    /// Model alias for the transcribe, modify and review subagents.
    pub model: String,
    /// Command prefix the transcribe subagent is allowed to run via Bash.
    pub transcribe_command: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            cli_path: std::env::var(CLI_PATH_ENV).unwrap_or_else(|_| "claude".to_string()),
            model: "opus".to_string(),
            transcribe_command: "podcast-agents transcribe".to_string(),
        }
    }
}

/// Transcription provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// Local whisper.cpp binary with a pretrained ggml model (default).
    #[default]
    Local,
    /// Hosted OpenAI Whisper API.
    OpenAI,
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "whisper.cpp" | "whisper-cpp" => Ok(TranscriptionProvider::Local),
            "openai" | "api" => Ok(TranscriptionProvider::OpenAI),
            _ => Err(format!("Unknown transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionProvider::Local => write!(f, "local"),
            TranscriptionProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription provider (local, openai).
    pub provider: TranscriptionProvider,
    /// whisper.cpp command-line binary.
    pub whisper_cli: String,
    /// Pretrained ggml model file for the local provider.
    pub model_path: String,
    /// Beam search width.
    pub beam_size: u32,
    /// Language hint (auto-detected when unset).
    pub language: Option<String>,
    /// CPU threads for the local provider.
    pub threads: Option<u32>,
    /// Model name for the hosted provider.
    pub openai_model: String,
    /// Duration in seconds for splitting long audio before upload.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::Local,
            whisper_cli: "whisper-cli".to_string(),
            model_path: "./models/ggml-small.bin".to_string(),
            beam_size: 5,
            language: None,
            threads: None,
            openai_model: "whisper-1".to_string(),
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory with `<name>.md` files overriding the built-in prompts.
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the project-local file or the user configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(Some(&Self::resolved_config_path()))
    }

    /// The file `load` reads: `./podcast-agents.toml` if present, else the user config.
    pub fn resolved_config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            local
        } else {
            Self::default_config_path()
        }
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Environment variables take precedence over values from the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CLI_PATH_ENV).filter(|p| !p.is_empty()) {
            self.agent.cli_path = path;
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PodcastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podcast-agents")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    pub fn log_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.log_dir)
    }

    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.audio_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.output_dir)
    }

    pub fn episode_assets_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.episode_assets_dir)
    }

    /// Raw transcripts written by the transcribe step.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.output_dir().join("transcripts")
    }

    /// Corrected, speaker-labelled transcripts written by the modify step.
    pub fn modified_transcripts_dir(&self) -> PathBuf {
        self.output_dir().join("modified_transcripts")
    }

    /// Review notes written by the review step.
    pub fn reviews_dir(&self) -> PathBuf {
        self.output_dir().join("reviews")
    }

    /// Execution plans written by the planner.
    pub fn plans_dir(&self) -> PathBuf {
        self.output_dir().join("plans")
    }

    /// Source audio for an episode.
    pub fn episode_audio_path(&self, number: &str) -> PathBuf {
        self.audio_dir().join(format!("{}.wav", number))
    }

    /// Raw transcript for an episode.
    pub fn episode_transcript_path(&self, number: &str) -> PathBuf {
        self.transcripts_dir().join(format!("{}.txt", number))
    }

    /// Get the expanded whisper.cpp model path.
    pub fn whisper_model_path(&self) -> PathBuf {
        Self::expand_path(&self.transcription.model_path)
    }

    /// Create every output directory the agents write into.
    pub fn ensure_output_dirs(&self) -> crate::error::Result<()> {
        for dir in [
            self.transcripts_dir(),
            self.modified_transcripts_dir(),
            self.reviews_dir(),
            self.plans_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
