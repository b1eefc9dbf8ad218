//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{Settings, TranscriptionProvider};
use crate::error::{PodcastError, Result};
use crate::transcription::is_api_key_configured;
use std::path::PathBuf;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The interactive workflow needs the agent runtime CLI.
    Workflow,
    /// Transcription needs ffmpeg plus the configured Whisper provider.
    Transcribe,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Workflow => {
            check_tool(&settings.agent.cli_path)?;
        }
        Operation::Transcribe => {
            check_tool("ffmpeg")?;
            match settings.transcription.provider {
                TranscriptionProvider::Local => {
                    check_model(settings)?;
                    check_on_path(&settings.transcription.whisper_cli)?;
                }
                TranscriptionProvider::OpenAI => {
                    check_api_key()?;
                    check_tool("ffprobe")?;
                }
            }
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(PodcastError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

fn check_model(settings: &Settings) -> Result<()> {
    let model = settings.whisper_model_path();
    if model.is_file() {
        Ok(())
    } else {
        Err(PodcastError::Config(format!(
            "Whisper model not found at {}. Download a ggml model or set transcription.model_path",
            model.display()
        )))
    }
}

/// Version flag for a tool. ffmpeg/ffprobe use -version (single dash).
pub fn version_arg(name: &str) -> &'static str {
    let program = std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    match program {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg(version_arg(name)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PodcastError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PodcastError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(PodcastError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// whisper.cpp has no version flag, so only its presence is checked.
fn check_on_path(name: &str) -> Result<()> {
    find_executable(name)
        .map(|_| ())
        .ok_or_else(|| PodcastError::ToolNotFound(name.to_string()))
}

/// Resolve a program the way a shell would: paths as given, bare names via PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(name);
        return path.is_file().then_some(path);
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_arg() {
        assert_eq!(version_arg("ffmpeg"), "-version");
        assert_eq!(version_arg("/usr/local/bin/ffprobe"), "-version");
        assert_eq!(version_arg("claude"), "--version");
    }

    #[test]
    fn test_find_executable_with_path() {
        let temp = tempfile::tempdir().unwrap();
        let tool = temp.path().join("whisper-cli");
        std::fs::write(&tool, b"").unwrap();

        assert_eq!(find_executable(tool.to_str().unwrap()), Some(tool));
        assert!(find_executable(temp.path().join("missing").to_str().unwrap()).is_none());
    }

    #[test]
    fn test_missing_model_fails_transcribe_preflight() {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.transcription.model_path =
            temp.path().join("ggml-none.bin").to_string_lossy().to_string();

        assert!(check_model(&settings).is_err());
        std::fs::write(settings.whisper_model_path(), b"ggml").unwrap();
        assert!(check_model(&settings).is_ok());
    }
}
