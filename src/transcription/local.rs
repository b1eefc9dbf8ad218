//! Offline transcription with a pretrained whisper.cpp model.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::audio::convert_to_whisper_wav;
use crate::config::TranscriptionSettings;
use crate::error::{PodcastError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// `[00:00:01.000 --> 00:00:04.500]   text`
const SEGMENT_LINE: &str =
    r"^\[(\d+):(\d{2}):(\d{2})[.,](\d{3}) --> (\d+):(\d{2}):(\d{2})[.,](\d{3})\]\s*(.*)$";

/// Language value that makes whisper.cpp detect the spoken language.
const AUTO_LANGUAGE: &str = "auto";

/// Transcriber backed by the whisper.cpp command-line binary.
pub struct LocalWhisperTranscriber {
    cli: String,
    model_path: PathBuf,
    beam_size: u32,
    language: Option<String>,
    threads: Option<u32>,
}

impl LocalWhisperTranscriber {
    pub fn new(cli: &str, model_path: PathBuf) -> Self {
        Self {
            cli: cli.to_string(),
            model_path,
            beam_size: 5,
            language: None,
            threads: None,
        }
    }

    pub fn from_settings(settings: &TranscriptionSettings, model_path: PathBuf) -> Self {
        Self {
            cli: settings.whisper_cli.clone(),
            model_path,
            beam_size: settings.beam_size,
            language: settings.language.clone(),
            threads: settings.threads,
        }
    }

    fn build_args(&self, wav: &Path, language: Option<&str>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            self.model_path.clone().into_os_string(),
            "-f".into(),
            wav.as_os_str().to_os_string(),
            "-bs".into(),
            self.beam_size.to_string().into(),
            "-np".into(),
        ];
        // whisper.cpp assumes English without -l; the show mixes Japanese and English.
        args.push("-l".into());
        args.push(language.or(self.language.as_deref()).unwrap_or(AUTO_LANGUAGE).into());
        if let Some(threads) = self.threads {
            args.push("-t".into());
            args.push(threads.to_string().into());
        }
        args
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn run(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        if !self.model_path.is_file() {
            return Err(PodcastError::Config(format!(
                "Whisper model not found at {}",
                self.model_path.display()
            )));
        }

        let temp_dir = tempfile::tempdir()?;
        let wav = temp_dir.path().join("input.wav");
        convert_to_whisper_wav(audio_path, &wav).await?;

        info!("Running {} with model {}", self.cli, self.model_path.display());

        let result = Command::new(&self.cli)
            .args(self.build_args(&wav, language))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PodcastError::ToolNotFound(self.cli.clone()));
            }
            Err(e) => {
                return Err(PodcastError::ToolFailed(format!("{} failed: {}", self.cli, e)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodcastError::Transcription(format!(
                "{} exited with {}: {}",
                self.cli,
                output.status,
                stderr.trim()
            )));
        }

        let segments = parse_whisper_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Transcribed {} segments", segments.len());

        let audio_id = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Transcript::new(audio_id, segments))
    }
}

#[async_trait]
impl Transcriber for LocalWhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.run(audio_path, None).await
    }

    async fn transcribe_with_language(&self, audio_path: &Path, language: &str) -> Result<Transcript> {
        self.run(audio_path, Some(language)).await
    }
}

/// Parse whisper.cpp stdout into segments.
///
/// Timestamped lines carry their own timing; any other non-empty line is
/// appended as a segment starting where the previous one ended.
fn parse_whisper_output(stdout: &str) -> Result<Vec<TranscriptSegment>> {
    let line_re = Regex::new(SEGMENT_LINE)
        .map_err(|e| PodcastError::Transcription(format!("Invalid segment pattern: {}", e)))?;

    let mut segments: Vec<TranscriptSegment> = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line_re.captures(line) {
            Some(caps) => {
                let time = |base: usize| -> f64 {
                    let part = |i: usize| caps[base + i].parse::<f64>().unwrap_or(0.0);
                    part(0) * 3600.0 + part(1) * 60.0 + part(2) + part(3) / 1000.0
                };
                let text = caps[9].trim().to_string();
                if !text.is_empty() {
                    segments.push(TranscriptSegment::new(time(1), time(5), text));
                }
            }
            None => {
                let start = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);
                segments.push(TranscriptSegment::new(start, start, line.to_string()));
            }
        }
    }

    Ok(segments)
}
