//! Hosted OpenAI Whisper transcription.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::audio::split_audio;
use crate::error::{PodcastError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct OpenAiWhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl OpenAiWhisperTranscriber {
    /// Create a new transcriber with custom configuration.
    pub fn with_config(
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks: max_concurrent_chunks.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        debug!("Uploading audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder.build()
            .map_err(|e| PodcastError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self.client.audio().transcribe_verbose_json(request).await
            .map_err(|e| PodcastError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = response.segments
            .map(|segs| {
                segs.iter()
                    .map(|s| TranscriptSegment::new(
                        s.start as f64,
                        s.end as f64,
                        s.text.trim().to_string(),
                    ))
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim().to_string(),
                )]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }

    /// Transcribe an audio file by uploading it as one or more MP3 chunks.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_with_splitting(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<Transcript> {
        let audio_id = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if let [(chunk_path, _)] = chunks.as_slice() {
            let segments = self.transcribe_single(chunk_path, language).await?;
            return Ok(Transcript::new(audio_id, segments));
        }

        let chunk_count = chunks.len();
        info!("Processing {} audio chunks with {}", chunk_count, self.model);

        let pb = ProgressBar::new(chunk_count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }

        let mut results: Vec<(usize, f64, Vec<TranscriptSegment>)> = Vec::with_capacity(chunk_count);

        let mut stream = stream::iter(chunks.into_iter().enumerate())
            .map(|(idx, (chunk_path, time_offset))| {
                let language = language.map(|s| s.to_string());
                async move {
                    let result = self.transcribe_single(&chunk_path, language.as_deref()).await;
                    (idx, time_offset, result)
                }
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, time_offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok(segments) => results.push((idx, time_offset, segments)),
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(PodcastError::Transcription(format!(
                        "Chunk {} at {:.0}s failed: {}",
                        idx, time_offset, e
                    )));
                }
            }
        }

        pb.finish_and_clear();

        Ok(Transcript::new(audio_id, merge_chunks(results)))
    }
}

/// Order chunk results and shift their timestamps by each chunk's offset.
fn merge_chunks(mut results: Vec<(usize, f64, Vec<TranscriptSegment>)>) -> Vec<TranscriptSegment> {
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut all_segments = Vec::new();
    for (_, time_offset, mut segments) in results {
        for segment in &mut segments {
            segment.start_seconds += time_offset;
            segment.end_seconds += time_offset;
        }
        all_segments.extend(segments);
    }
    all_segments
}

#[async_trait]
impl Transcriber for OpenAiWhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path, None).await
    }

    async fn transcribe_with_language(&self, audio_path: &Path, language: &str) -> Result<Transcript> {
        self.transcribe_with_splitting(audio_path, Some(language)).await
    }
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_chunks_orders_and_offsets() {
        let results = vec![
            (1, 600.0, vec![TranscriptSegment::new(0.0, 4.0, "second".to_string())]),
            (0, 0.0, vec![
                TranscriptSegment::new(0.0, 2.0, "first".to_string()),
                TranscriptSegment::new(2.0, 5.0, "still first".to_string()),
            ]),
        ];

        let merged = merge_chunks(results);
        let texts: Vec<_> = merged.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "still first", "second"]);
        assert_eq!(merged[2].start_seconds, 600.0);
        assert_eq!(merged[2].end_seconds, 604.0);
    }
}
