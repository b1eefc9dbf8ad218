//! PreToolUse hook that gates every Bash command the agents try to run.
//!
//! The only process an agent may start is the episode transcription tool,
//! invoked as `<transcribe command> --number <digits>`. Everything else is
//! denied before the runtime executes it.

use crate::error::{PodcastError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

const PRE_TOOL_USE: &str = "PreToolUse";

/// Characters that would let a command escape the single allowed invocation.
const SHELL_METACHARACTERS: &str = r#"[;&|<>$`\\(){}\[\]*?!~#'"\r\n]"#;

/// Characters bash splits words on. Other Unicode whitespace stays inside a word.
const WORD_SEPARATORS: [char; 2] = [' ', '\t'];

/// Hook payload sent by the agent runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub hook_event_name: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: serde_json::Value,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

impl HookInput {
    /// The shell command carried by a Bash tool call, or "" if absent.
    pub fn command(&self) -> &str {
        self.tool_input
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: String,
    pub permission_decision: PermissionDecision,
    pub permission_decision_reason: String,
}

/// Hook response. Serializes to `{}` when the hook has no opinion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

impl HookOutput {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self::decision(PermissionDecision::Allow, reason.into())
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::decision(PermissionDecision::Deny, reason.into())
    }

    fn decision(decision: PermissionDecision, reason: String) -> Self {
        Self {
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: PRE_TOOL_USE.to_string(),
                permission_decision: decision,
                permission_decision_reason: reason,
            }),
        }
    }

    pub fn permission_decision(&self) -> Option<PermissionDecision> {
        self.hook_specific_output
            .as_ref()
            .map(|o| o.permission_decision)
    }
}

/// Why a command was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("Empty command is not allowed")]
    Empty,

    #[error("shell metacharacter {0:?} is not allowed")]
    ShellMetacharacter(char),

    #[error("only '{0}' may be executed")]
    UnexpectedCommand(String),

    #[error("episode number is missing")]
    MissingEpisode,

    #[error("unexpected arguments: {0}")]
    UnexpectedArguments(String),

    #[error("episode number must be numeric, got {0:?}")]
    NonNumericEpisode(String),
}

/// Allowlist for the single command agents may run.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    prefix: Vec<String>,
    metacharacters: Regex,
    episode: Regex,
}

impl CommandPolicy {
    /// Build a policy allowing `<transcribe_command> --number <digits>`.
    pub fn new(transcribe_command: &str) -> Result<Self> {
        let metacharacters = Regex::new(SHELL_METACHARACTERS)
            .map_err(|e| PodcastError::Config(format!("Invalid metacharacter pattern: {}", e)))?;
        let episode = Regex::new(r"^[0-9]+$")
            .map_err(|e| PodcastError::Config(format!("Invalid episode pattern: {}", e)))?;

        let prefix: Vec<String> = transcribe_command
            .split(WORD_SEPARATORS)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if prefix.is_empty() {
            return Err(PodcastError::Config(
                "agent.transcribe_command must not be empty".to_string(),
            ));
        }
        if metacharacters.is_match(transcribe_command) {
            return Err(PodcastError::Config(format!(
                "agent.transcribe_command contains shell metacharacters: {}",
                transcribe_command
            )));
        }

        Ok(Self {
            prefix,
            metacharacters,
            episode,
        })
    }

    /// The allowed command prefix, space separated.
    pub fn prefix(&self) -> String {
        self.prefix.join(" ")
    }

    /// Check a command, returning the episode number it targets.
    pub fn check(&self, command: &str) -> std::result::Result<String, Rejection> {
        if command.trim().is_empty() {
            return Err(Rejection::Empty);
        }

        if let Some(m) = self.metacharacters.find(command) {
            let ch = m.as_str().chars().next().unwrap_or_default();
            return Err(Rejection::ShellMetacharacter(ch));
        }

        let tokens: Vec<&str> = command
            .split(WORD_SEPARATORS)
            .filter(|t| !t.is_empty())
            .collect();
        let prefix_matches = tokens.len() >= self.prefix.len()
            && tokens.iter().zip(&self.prefix).all(|(t, p)| t == p);
        if !prefix_matches {
            return Err(Rejection::UnexpectedCommand(self.prefix()));
        }

        let episode = match &tokens[self.prefix.len()..] {
            [] => return Err(Rejection::MissingEpisode),
            [flag] if *flag == "-n" || *flag == "--number" => {
                return Err(Rejection::MissingEpisode)
            }
            [flag] => match flag.strip_prefix("--number=") {
                Some(value) => value,
                None => return Err(Rejection::UnexpectedArguments(flag.to_string())),
            },
            [flag, value] if *flag == "-n" || *flag == "--number" => *value,
            rest => return Err(Rejection::UnexpectedArguments(rest.join(" "))),
        };

        if !self.episode.is_match(episode) {
            return Err(Rejection::NonNumericEpisode(episode.to_string()));
        }

        Ok(episode.to_string())
    }
}

/// Decide whether a PreToolUse Bash call may proceed.
pub fn validate_bash_command(input: &HookInput, policy: &CommandPolicy) -> HookOutput {
    if input.hook_event_name != PRE_TOOL_USE {
        return HookOutput::default();
    }

    let command = input.command();

    match policy.check(command) {
        Ok(episode) => {
            info!("[ALLOWED] Command: {} (episode {})", command, episode);
            HookOutput::allow("Command validated successfully")
        }
        Err(Rejection::Empty) => {
            warn!("[BLOCKED] Empty command");
            HookOutput::deny(Rejection::Empty.to_string())
        }
        Err(rejection) => {
            warn!("[BLOCKED] Command: {} ({})", command, rejection);
            HookOutput::deny(format!(
                "Security violation: only '{} --number <episode>' is allowed ({}). Attempted command: {}",
                policy.prefix(),
                rejection,
                command
            ))
        }
    }
}

/// Read one hook payload from `reader` and write the decision to `writer`.
///
/// Unparseable payloads are denied rather than passed through.
pub fn handle_hook_io<R: Read, W: Write>(
    policy: &CommandPolicy,
    mut reader: R,
    mut writer: W,
) -> Result<HookOutput> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;

    let output = match serde_json::from_str::<HookInput>(&raw) {
        Ok(input) => {
            debug!(
                "Hook invoked: event={}, tool={:?}, session={:?}",
                input.hook_event_name, input.tool_name, input.session_id
            );
            validate_bash_command(&input, policy)
        }
        Err(e) => {
            warn!("[BLOCKED] Malformed hook input: {}", e);
            HookOutput::deny(format!("Malformed hook input: {}", e))
        }
    };

    serde_json::to_writer(&mut writer, &output)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(output)
}

/// Shell command the runtime should run to reach this hook.
pub fn hook_command(exe: &Path, config: Option<&Path>) -> String {
    let mut command = shell_quote(&exe.to_string_lossy());
    if let Some(config) = config {
        command.push_str(" --config ");
        command.push_str(&shell_quote(&config.to_string_lossy()));
    }
    command.push_str(" hook");
    command
}

fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:=".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn policy() -> CommandPolicy {
        CommandPolicy::new("podcast-agents transcribe").unwrap()
    }

    fn bash(command: &str) -> HookInput {
        HookInput {
            hook_event_name: "PreToolUse".to_string(),
            tool_name: Some("Bash".to_string()),
            tool_input: serde_json::json!({ "command": command }),
            ..Default::default()
        }
    }

    #[test]
    fn test_allows_exact_invocation() {
        let policy = policy();
        assert_eq!(policy.check("podcast-agents transcribe --number 12"), Ok("12".to_string()));
        assert_eq!(policy.check("podcast-agents transcribe -n 7"), Ok("7".to_string()));
        assert_eq!(policy.check("podcast-agents transcribe --number=105"), Ok("105".to_string()));
        assert_eq!(policy.check("  podcast-agents   transcribe  -n 3 "), Ok("3".to_string()));
    }

    #[test]
    fn test_rejects_other_commands() {
        let policy = policy();
        assert_eq!(
            policy.check("ls -la"),
            Err(Rejection::UnexpectedCommand("podcast-agents transcribe".to_string()))
        );
        assert!(matches!(
            policy.check("podcast-agents hook --number 1"),
            Err(Rejection::UnexpectedCommand(_))
        ));
        assert!(matches!(
            policy.check("podcast-agents"),
            Err(Rejection::UnexpectedCommand(_))
        ));
        assert!(matches!(
            policy.check("/tmp/podcast-agents transcribe --number 1"),
            Err(Rejection::UnexpectedCommand(_))
        ));
    }

    #[test]
    fn test_rejects_non_numeric_episode() {
        let policy = policy();
        assert_eq!(
            policy.check("podcast-agents transcribe --number 12a"),
            Err(Rejection::NonNumericEpisode("12a".to_string()))
        );
        assert_eq!(
            policy.check("podcast-agents transcribe -n ../12"),
            Err(Rejection::NonNumericEpisode("../12".to_string()))
        );
        assert_eq!(
            policy.check("podcast-agents transcribe --number=-1"),
            Err(Rejection::NonNumericEpisode("-1".to_string()))
        );
    }

    #[test]
    fn test_rejects_shell_metacharacters() {
        let policy = policy();
        for (command, ch) in [
            ("podcast-agents transcribe --number 12; rm -rf /", ';'),
            ("podcast-agents transcribe --number 12 && curl x", '&'),
            ("podcast-agents transcribe --number $(id)", '$'),
            ("podcast-agents transcribe --number `id`", '`'),
            ("podcast-agents transcribe --number 12 > /etc/passwd", '>'),
            ("podcast-agents transcribe --number 12 | sh", '|'),
            ("podcast-agents transcribe --number '12'", '\''),
            ("podcast-agents transcribe --number 12\nrm x", '\n'),
        ] {
            assert_eq!(policy.check(command), Err(Rejection::ShellMetacharacter(ch)), "{}", command);
        }
    }

    #[test]
    fn test_rejects_missing_or_extra_arguments() {
        let policy = policy();
        assert_eq!(policy.check("podcast-agents transcribe"), Err(Rejection::MissingEpisode));
        assert_eq!(policy.check("podcast-agents transcribe -n"), Err(Rejection::MissingEpisode));
        assert!(matches!(
            policy.check("podcast-agents transcribe 12"),
            Err(Rejection::UnexpectedArguments(_))
        ));
        assert!(matches!(
            policy.check("podcast-agents transcribe --number 12 --force"),
            Err(Rejection::UnexpectedArguments(_))
        ));
        assert!(matches!(
            policy.check("podcast-agents transcribe --episode 12"),
            Err(Rejection::UnexpectedArguments(_))
        ));
    }

    #[test]
    fn test_only_space_and_tab_separate_words() {
        let policy = policy();
        assert_eq!(policy.check("podcast-agents\ttranscribe\t-n 8"), Ok("8".to_string()));
        assert!(matches!(
            policy.check("podcast-agents\u{a0}transcribe -n 1"),
            Err(Rejection::UnexpectedCommand(_))
        ));
        assert!(matches!(
            policy.check("podcast-agents transcribe -n\u{a0}1"),
            Err(Rejection::UnexpectedArguments(_))
        ));
        assert_eq!(
            policy.check("podcast-agents transcribe --number 1\u{b}"),
            Err(Rejection::NonNumericEpisode("1\u{b}".to_string()))
        );
        assert_eq!(
            policy.check("podcast-agents transcribe --number\u{c}1"),
            Err(Rejection::UnexpectedArguments("--number\u{c}1".to_string()))
        );
    }

    #[test]
    fn test_policy_requires_clean_prefix() {
        assert!(CommandPolicy::new("   ").is_err());
        assert!(CommandPolicy::new("sh -c transcribe;").is_err());
        let multi = CommandPolicy::new("uv run podcast-transcribe").unwrap();
        assert_eq!(multi.check("uv run podcast-transcribe -n 4"), Ok("4".to_string()));
    }

    #[test]
    fn test_hook_decisions() {
        let policy = policy();

        let allowed = validate_bash_command(&bash("podcast-agents transcribe --number 12"), &policy);
        assert_eq!(allowed.permission_decision(), Some(PermissionDecision::Allow));

        let denied = validate_bash_command(&bash("cat /etc/passwd"), &policy);
        assert_eq!(denied.permission_decision(), Some(PermissionDecision::Deny));
        let reason = &denied.hook_specific_output.unwrap().permission_decision_reason;
        assert!(reason.starts_with("Security violation"));
        assert!(reason.contains("cat /etc/passwd"));

        let empty = validate_bash_command(&bash(""), &policy);
        assert_eq!(
            empty.hook_specific_output.unwrap().permission_decision_reason,
            "Empty command is not allowed"
        );
    }

    #[test]
    fn test_ignores_other_events() {
        let mut input = bash("rm -rf /");
        input.hook_event_name = "PostToolUse".to_string();
        let output = validate_bash_command(&input, &policy());
        assert_eq!(output, HookOutput::default());
        assert_eq!(serde_json::to_string(&output).unwrap(), "{}");
    }

    #[test]
    fn test_hook_io_wire_format() {
        let payload = r#"{"session_id":"abc","hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"podcast-agents transcribe -n 9","description":"Transcribe"}}"#;
        let mut out = Vec::new();
        handle_hook_io(&policy(), payload.as_bytes(), &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["hookSpecificOutput"]["hookEventName"], "PreToolUse");
        assert_eq!(json["hookSpecificOutput"]["permissionDecision"], "allow");
        assert_eq!(
            json["hookSpecificOutput"]["permissionDecisionReason"],
            "Command validated successfully"
        );
    }

    #[test]
    fn test_hook_io_denies_malformed_input() {
        let mut out = Vec::new();
        let output = handle_hook_io(&policy(), "not json".as_bytes(), &mut out).unwrap();
        assert_eq!(output.permission_decision(), Some(PermissionDecision::Deny));

        let mut out = Vec::new();
        let payload = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":"ls"}"#;
        let output = handle_hook_io(&policy(), payload.as_bytes(), &mut out).unwrap();
        assert_eq!(output.permission_decision(), Some(PermissionDecision::Deny));
    }

    #[test]
    fn test_hook_command_quoting() {
        assert_eq!(
            hook_command(&PathBuf::from("/usr/local/bin/podcast-agents"), None),
            "/usr/local/bin/podcast-agents hook"
        );
        assert_eq!(
            hook_command(
                &PathBuf::from("/opt/My Tools/podcast-agents"),
                Some(&PathBuf::from("/home/me/it's.toml"))
            ),
            "'/opt/My Tools/podcast-agents' --config '/home/me/it'\\''s.toml' hook"
        );
    }
}
