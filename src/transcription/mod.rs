//! Transcription module for the podcast pipeline.
//!
//! Converts episode audio to text with a pretrained Whisper model.
//!
//! # Providers
//!
//! - **Local** (default): whisper.cpp binary with a ggml model, fully offline.
//! - **OpenAI**: hosted Whisper API; long audio is split into chunks first.

mod episode;
mod local;
mod models;
mod openai;

pub use episode::{transcribe_episode, validate_episode_number, EpisodeTranscription};
pub use local::LocalWhisperTranscriber;
pub use models::{Transcript, TranscriptSegment};
pub use openai::{is_api_key_configured, OpenAiWhisperTranscriber};

use crate::config::{Settings, TranscriptionProvider};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;

    /// Transcribe an audio file with a specific language hint.
    async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<Transcript>;
}

/// Create the transcriber selected in the settings.
pub fn create_transcriber(settings: &Settings) -> Result<Box<dyn Transcriber>> {
    let config = &settings.transcription;
    Ok(match config.provider {
        TranscriptionProvider::Local => Box::new(LocalWhisperTranscriber::from_settings(
            config,
            settings.whisper_model_path(),
        )),
        TranscriptionProvider::OpenAI => Box::new(OpenAiWhisperTranscriber::with_config(
            &config.openai_model,
            config.chunk_duration_seconds,
            config.max_concurrent_chunks,
        )?),
    })
}
