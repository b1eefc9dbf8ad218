//! Init command - first-run setup of the working directory.

use crate::cli::preflight::find_executable;
use crate::cli::Output;
use crate::config::{Settings, TranscriptionProvider, LOCAL_CONFIG_FILE};
use console::style;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("podcast-agents Setup");
    println!();

    // Step 1: Check prerequisites
    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let missing = missing_tools(settings);
    if missing.is_empty() {
        Output::success("All required tools are installed!");
    } else {
        Output::warning("Some tools are missing. Please install them:");
        for name in &missing {
            println!("  {} {} - not found", style("✗").red(), style(name).bold());
        }
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    for (label, dir) in working_dirs(settings) {
        if create_dir(&dir)? {
            Output::success(&format!("Created {}: {}", label, dir.display()));
        } else {
            Output::info(&format!("{} exists: {}", label, dir.display()));
        }
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = PathBuf::from(LOCAL_CONFIG_FILE);
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create a project-local configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Put episode audio at {}",
        style("1.").cyan(),
        settings.episode_audio_path("<number>").display()
    );
    println!("  {} Check system status", style("podcast-agents doctor").cyan());
    println!("  {} Start the interactive workflow", style("podcast-agents").cyan());

    Ok(())
}

/// Every directory the workflow reads from or writes into.
fn working_dirs(settings: &Settings) -> Vec<(&'static str, PathBuf)> {
    vec![
        ("Audio directory", settings.audio_dir()),
        ("Episode assets", settings.episode_assets_dir()),
        ("Transcripts", settings.transcripts_dir()),
        ("Modified transcripts", settings.modified_transcripts_dir()),
        ("Reviews", settings.reviews_dir()),
        ("Plans", settings.plans_dir()),
        ("Logs", settings.log_dir()),
    ]
}

/// Returns true when the directory was created.
fn create_dir(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(dir)?;
    Ok(true)
}

fn missing_tools(settings: &Settings) -> Vec<String> {
    let mut tools = vec![settings.agent.cli_path.clone(), "ffmpeg".to_string()];
    match settings.transcription.provider {
        TranscriptionProvider::Local => tools.push(settings.transcription.whisper_cli.clone()),
        TranscriptionProvider::OpenAI => tools.push("ffprobe".to_string()),
    }
    tools
        .into_iter()
        .filter(|tool| find_executable(tool).is_none())
        .collect()
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
