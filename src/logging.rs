//! Logging setup: a timestamped log file per run plus optional console output.

use crate::config::Settings;
use crate::error::{PodcastError, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Console level for a `-v` count. The log file always uses the configured level.
pub fn console_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Log file name for a run started now.
pub fn log_file_name() -> String {
    format!("podcast_agent_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

fn filter(level: &str) -> EnvFilter {
    match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(format!("podcast_agents={}", level)),
    }
}

/// Install the global subscriber and return the log file path.
///
/// With `console` off nothing is written to the terminal, which keeps the
/// hook's stdout reserved for its JSON reply.
pub fn init_logging(settings: &Settings, verbose: u8, console: bool) -> Result<PathBuf> {
    let log_dir = settings.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(log_file_name());
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(filter(&settings.general.log_level));

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter(console_level(verbose)))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| PodcastError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_level() {
        assert_eq!(console_level(0), "warn");
        assert_eq!(console_level(1), "info");
        assert_eq!(console_level(2), "debug");
        assert_eq!(console_level(9), "trace");
    }

    #[test]
    fn test_log_file_name_format() {
        let name = log_file_name();
        assert!(name.starts_with("podcast_agent_"));
        assert!(name.ends_with(".log"));
        // podcast_agent_YYYYMMDD_HHMMSS.log
        assert_eq!(name.len(), "podcast_agent_".len() + 15 + ".log".len());
    }
}
