//! Transcribe command - the only command agents may run through Bash.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{create_transcriber, transcribe_episode, validate_episode_number};
use anyhow::Result;

/// Transcribe `audio/<number>.wav` into the transcripts directory.
pub async fn run_transcribe(number: &str, settings: &Settings) -> Result<()> {
    let number = validate_episode_number(number)?;

    if let Err(e) = preflight::check(Operation::Transcribe, settings) {
        Output::error(&format!("Pre-flight check failed: {}", e));
        Output::info("Run 'podcast-agents doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let transcriber = create_transcriber(settings)?;

    println!(
        "Starting transcription: {}",
        settings.episode_audio_path(number).display()
    );
    let spinner = Output::spinner(&format!(
        "Transcribing episode {} ({})",
        number, settings.transcription.provider
    ));

    let result = transcribe_episode(settings, transcriber.as_ref(), number).await;
    spinner.finish_and_clear();

    match result {
        Ok(done) => {
            Output::success(&format!("Transcript written to {}", done.output.display()));
            Output::kv("Segments", &done.segments.to_string());
            println!("Transcription time: {:.2} seconds", done.elapsed.as_secs_f64());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Transcription failed: {}", e));
            Err(e.into())
        }
    }
}
