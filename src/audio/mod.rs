//! Audio preparation with ffmpeg/ffprobe.

mod ffmpeg;

pub use ffmpeg::{convert_to_whisper_wav, probe_duration, split_audio};
