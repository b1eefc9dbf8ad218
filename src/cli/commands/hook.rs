//! Hook command - PreToolUse entry point invoked by the agent runtime.
//!
//! Stdout carries exactly one JSON reply; all diagnostics go to the log file.

use crate::agent::hook::handle_hook_io;
use crate::agent::CommandPolicy;
use crate::config::Settings;
use crate::logging;
use std::path::PathBuf;

/// Exit code that makes the runtime block the tool call outright.
pub const BLOCKING_EXIT_CODE: i32 = 2;

/// Answer one hook request and return the process exit code.
pub fn run_hook(config: Option<&str>, verbose: u8) -> i32 {
    match answer(config, verbose) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("podcast-agents hook: {}", e);
            BLOCKING_EXIT_CODE
        }
    }
}

fn answer(config: Option<&str>, verbose: u8) -> crate::Result<()> {
    let settings = match config {
        Some(path) => Settings::load_from(Some(&PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // The decision must still be made when the log directory is unwritable.
    if let Err(e) = logging::init_logging(&settings, verbose, false) {
        eprintln!("podcast-agents hook: logging disabled: {}", e);
    }

    let policy = CommandPolicy::new(&settings.agent.transcribe_command)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    handle_hook_io(&policy, stdin.lock(), stdout.lock())?;
    Ok(())
}
