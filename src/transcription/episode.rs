//! Transcribe one episode from the audio directory into the transcripts directory.

use super::Transcriber;
use crate::config::Settings;
use crate::error::{PodcastError, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of transcribing one episode.
#[derive(Debug, Clone)]
pub struct EpisodeTranscription {
    pub number: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub segments: usize,
    pub elapsed: Duration,
}

/// Episode numbers are non-empty runs of ASCII digits.
pub fn validate_episode_number(number: &str) -> Result<&str> {
    if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(number)
    } else {
        Err(PodcastError::InvalidInput(format!(
            "episode number must be numeric (e.g. 12), got {:?}",
            number
        )))
    }
}

/// Transcribe `audio/<number>.wav` into `transcripts/<number>.txt`.
pub async fn transcribe_episode(
    settings: &Settings,
    transcriber: &dyn Transcriber,
    number: &str,
) -> Result<EpisodeTranscription> {
    let number = validate_episode_number(number)?;

    let input = settings.episode_audio_path(number);
    if !input.is_file() {
        return Err(PodcastError::InputNotFound(input));
    }

    info!("Starting transcription: {}", input.display());
    let started = Instant::now();

    let transcript = match settings.transcription.language.as_deref() {
        Some(lang) => transcriber.transcribe_with_language(&input, lang).await?,
        None => transcriber.transcribe(&input).await?,
    };

    let output = settings.episode_transcript_path(number);
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output, transcript.to_plain_text()).await?;

    let elapsed = started.elapsed();
    info!(
        "Transcription time: {:.2} seconds ({} segments, {})",
        elapsed.as_secs_f64(),
        transcript.segments.len(),
        output.display()
    );

    Ok(EpisodeTranscription {
        number: number.to_string(),
        input,
        output,
        segments: transcript.segments.len(),
        elapsed,
    })
}
