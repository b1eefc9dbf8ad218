//! ffmpeg and ffprobe wrappers.
//!
//! Episode audio is recorded as WAV. The local whisper.cpp model needs 16 kHz
//! mono PCM, and the hosted API needs uploads small enough to fit its size
//! limit, so audio is converted or split here before transcription.

use crate::error::{PodcastError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Sample rate expected by whisper.cpp models.
const WHISPER_SAMPLE_RATE: &str = "16000";

/// Converts any audio file to 16 kHz mono 16-bit PCM WAV.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn convert_to_whisper_wav(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting to 16 kHz mono WAV at {}", dest.display());

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-ar").arg(WHISPER_SAMPLE_RATE)
        .arg("-ac").arg("1")
        .arg("-c:a").arg("pcm_s16le")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(PodcastError::ToolFailed(format!("ffmpeg conversion failed: {}", err.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PodcastError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(PodcastError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Segments an audio file into MP3 chunks for upload.
///
/// Each chunk will be at most `chunk_seconds` long. Returns tuples of
/// (chunk_path, offset_seconds) for each segment.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    // Short files still get one re-encoded chunk; raw WAV is too large to upload.
    let chunk_len = chunk_seconds.max(1) as f64;

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        let segment_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &segment_path, offset, segment_len).await?;

        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push((segment_path, offset));

        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Extracts a time segment from an audio file as MP3.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() && dest.exists() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            warn!("Segment extraction at {:.1}s failed", start);
            Err(PodcastError::ToolFailed(format!("Segment extraction failed: {}", err.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PodcastError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(PodcastError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PodcastError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(PodcastError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(PodcastError::ToolFailed(format!(
            "ffprobe could not read {}",
            path.display()
        )));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json_str: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| PodcastError::ToolFailed("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| PodcastError::ToolFailed("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let json = r#"{"format":{"filename":"12.wav","duration":"3605.250000","format_name":"wav"}}"#;
        assert_eq!(parse_probe_duration(json).unwrap(), 3605.25);
    }

    #[test]
    fn test_parse_probe_duration_missing() {
        assert!(parse_probe_duration(r#"{"format":{}}"#).is_err());
        assert!(parse_probe_duration("not json").is_err());
    }
}
