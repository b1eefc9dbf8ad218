//! Doctor command - verify system requirements and configuration.

use crate::agent::CommandPolicy;
use crate::cli::preflight::{find_executable, version_arg};
use crate::cli::{format_size, Output};
use crate::config::{Settings, TranscriptionProvider};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("podcast-agents Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let tools = check_tools(settings);
    print_section("External Tools", &tools);
    checks.extend(tools);

    let transcription = check_transcription(settings);
    print_section("Transcription", &transcription);
    checks.extend(transcription);

    let agent = check_agent(settings);
    print_section("Agent Runtime", &agent);
    checks.extend(agent);

    let dirs = check_directories(settings);
    print_section("Directories", &dirs);
    checks.extend(dirs);

    let config = vec![check_config_file()];
    print_section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running the workflow.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! podcast-agents is ready to use.");
    }

    Ok(())
}

fn check_tools(settings: &Settings) -> Vec<CheckResult> {
    let mut checks = vec![
        check_tool(&settings.agent.cli_path, install_hint_agent()),
        check_tool("ffmpeg", install_hint_ffmpeg()),
    ];
    match settings.transcription.provider {
        TranscriptionProvider::Local => {
            let cli = &settings.transcription.whisper_cli;
            checks.push(match find_executable(cli) {
                Some(path) => CheckResult::ok(cli, &path.display().to_string()),
                None => CheckResult::error(cli, "not found", install_hint_whisper()),
            });
        }
        TranscriptionProvider::OpenAI => {
            checks.push(check_tool("ffprobe", install_hint_ffmpeg()));
        }
    }
    checks
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg(version_arg(name)).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

fn check_transcription(settings: &Settings) -> Vec<CheckResult> {
    let provider = CheckResult::ok("Provider", &settings.transcription.provider.to_string());

    let backend = match settings.transcription.provider {
        TranscriptionProvider::Local => {
            let model = settings.whisper_model_path();
            match std::fs::metadata(&model) {
                Ok(meta) if meta.is_file() => CheckResult::ok(
                    "Whisper model",
                    &format!("{} ({})", model.display(), format_size(meta.len())),
                ),
                _ => CheckResult::error(
                    "Whisper model",
                    &format!("{} not found", model.display()),
                    "Download a ggml model from https://huggingface.co/ggerganov/whisper.cpp",
                ),
            }
        }
        TranscriptionProvider::OpenAI => check_openai_api_key(),
    };

    vec![provider, backend]
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// First seven and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// The transcribe subagent can only run the allowlisted command, so it must resolve.
fn check_agent(settings: &Settings) -> Vec<CheckResult> {
    let command = &settings.agent.transcribe_command;
    let policy = match CommandPolicy::new(command) {
        Ok(_) => CheckResult::ok("Allowed command", &format!("{} --number <episode>", command)),
        Err(e) => CheckResult::error(
            "Allowed command",
            &e.to_string(),
            "Set agent.transcribe_command to a plain command such as 'podcast-agents transcribe'",
        ),
    };

    let program = command.split_whitespace().next().unwrap_or_default();
    let resolvable = match find_executable(program) {
        Some(path) => CheckResult::ok("Transcribe program", &path.display().to_string()),
        None => CheckResult::warning(
            "Transcribe program",
            &format!("{} not found on PATH", program),
            "Install with: cargo install --path . (or point agent.transcribe_command at the binary)",
        ),
    };

    vec![policy, resolvable]
}

/// Check working directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let audio_dir = settings.audio_dir();
    if audio_dir.is_dir() {
        let episodes = std::fs::read_dir(&audio_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "wav"))
                    .count()
            })
            .unwrap_or(0);
        results.push(CheckResult::ok(
            "Audio directory",
            &format!("{} ({} episode(s))", audio_dir.display(), episodes),
        ));
    } else {
        results.push(CheckResult::warning(
            "Audio directory",
            &format!("{} (missing)", audio_dir.display()),
            "Create with: podcast-agents init",
        ));
    }

    for (name, dir) in [
        ("Output directory", settings.output_dir()),
        ("Episode assets", settings.episode_assets_dir()),
        ("Log directory", settings.log_dir()),
    ] {
        if dir.is_dir() {
            results.push(CheckResult::ok(name, &dir.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            ));
        }
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::resolved_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: podcast-agents init",
        )
    }
}

fn install_hint_agent() -> &'static str {
    "Install the agent runtime CLI (npm install -g @anthropic-ai/claude-code) or set agent.cli_path"
}

/// Platform-specific install hint for whisper.cpp.
fn install_hint_whisper() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install whisper-cpp"
    } else {
        "Build from: https://github.com/ggerganov/whisper.cpp (or set transcription.whisper_cli)"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-proj-abcdefghijklmnop1234"), "sk-proj...1234");
        // Multi-byte characters at the cut points must not split a code point.
        assert_eq!(mask_key("sk-ééééééééééééééééééé1234"), "sk-éééé...1234");
        assert_eq!(mask_key("sk-abcdefghijklmnopqrsé"), "sk-abcd...qrsé");
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.transcription.model_path =
            temp.path().join("ggml-none.bin").to_string_lossy().to_string();

        let checks = check_transcription(&settings);
        assert_eq!(checks[1].status, CheckStatus::Error);
    }

    #[test]
    fn test_bad_transcribe_command_is_an_error() {
        let mut settings = Settings::default();
        settings.agent.transcribe_command = "rm -rf; echo".to_string();

        let checks = check_agent(&settings);
        assert_eq!(checks[0].status, CheckStatus::Error);
    }
}
