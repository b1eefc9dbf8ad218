//! Agent option builders for the planner and the production workflow.

use crate::config::{Prompts, Settings};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the runtime treats tool calls that need permission.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    #[default]
    Default,
    AcceptEdits,
    BypassPermissions,
    Plan,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

/// Lifecycle points at which the runtime invokes hooks.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    Stop,
    SubagentStop,
    PreCompact,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::PreCompact => "PreCompact",
        }
    }
}

/// A hook command bound to an event and a tool-name matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct HookMatcher {
    pub event: HookEvent,
    /// Tool name pattern (e.g. "Bash").
    pub matcher: String,
    /// Shell command the runtime executes with the hook JSON on stdin.
    pub command: String,
}

/// A specialised subagent the master agent can delegate to.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentDefinition {
    pub description: String,
    pub prompt: String,
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Everything the runtime needs to start one agent session.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub allowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    pub cwd: PathBuf,
    pub system_prompt: String,
    pub agents: BTreeMap<String, AgentDefinition>,
    pub hooks: Vec<HookMatcher>,
}

impl AgentOptions {
    /// Render the options as runtime CLI flags.
    pub fn to_cli_args(&self) -> Result<Vec<String>> {
        let mut args = Vec::new();

        if !self.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.allowed_tools.join(","));
        }

        args.push("--permission-mode".to_string());
        args.push(self.permission_mode.as_str().to_string());

        args.push("--system-prompt".to_string());
        args.push(self.system_prompt.clone());

        if !self.agents.is_empty() {
            args.push("--agents".to_string());
            args.push(serde_json::to_string(&self.agents)?);
        }

        if !self.hooks.is_empty() {
            args.push("--settings".to_string());
            args.push(serde_json::to_string(&self.hook_settings())?);
        }

        Ok(args)
    }

    /// Hook configuration in the runtime's settings format.
    pub fn hook_settings(&self) -> serde_json::Value {
        let mut by_event: BTreeMap<&str, Vec<serde_json::Value>> = BTreeMap::new();
        for hook in &self.hooks {
            by_event
                .entry(hook.event.as_str())
                .or_default()
                .push(serde_json::json!({
                    "matcher": hook.matcher,
                    "hooks": [{ "type": "command", "command": hook.command }]
                }));
        }
        serde_json::json!({ "hooks": by_event })
    }
}

fn tools(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Build the master workflow agent with its transcribe, modify and review subagents.
///
/// Output directories are created up front so subagents can write into them.
/// `hook_command` is the shell command that validates every Bash invocation.
pub fn build_workflow_agent(
    settings: &Settings,
    prompts: &Prompts,
    hook_command: &str,
) -> Result<AgentOptions> {
    settings.ensure_output_dirs()?;

    let model = Some(settings.agent.model.clone());
    let mut agents = BTreeMap::new();

    agents.insert(
        "transcribe".to_string(),
        AgentDefinition {
            description: format!(
                "Audio transcription specialist. Use for transcribing podcast audio files \
                 to text using Whisper model. You MUST pass target episode number to this agent. \
                 Audio directory: {}, Output directory: {}",
                settings.audio_dir().display(),
                settings.transcripts_dir().display()
            ),
            prompt: prompts.load_prompt("transcribe")?,
            tools: tools(&["Read", "Write", "Bash", "Glob", "Grep", "TaskOutput"]),
            model: model.clone(),
        },
    );

    agents.insert(
        "modify".to_string(),
        AgentDefinition {
            description: format!(
                "Transcript correction and formatting specialist. Use for correcting transcription \
                 errors, identifying speakers, and formatting transcripts. \
                 Handles: typo correction, speaker identification, formatting. \
                 Input directory: {}, Output directory: {}",
                settings.transcripts_dir().display(),
                settings.modified_transcripts_dir().display()
            ),
            prompt: prompts.load_prompt("modify")?,
            tools: tools(&["Read", "Write", "Glob", "Grep"]),
            model: model.clone(),
        },
    );

    agents.insert(
        "review".to_string(),
        AgentDefinition {
            description: format!(
                "Technical podcast review specialist. Use for reviewing podcast transcripts \
                 for technical accuracy, terminology issues, and reputational risks. \
                 Handles: technical accuracy review, fact-checking, controversy detection. \
                 Input directory: {}, Output directory: {}, Episode assets: {}",
                settings.modified_transcripts_dir().display(),
                settings.reviews_dir().display(),
                settings.episode_assets_dir().display()
            ),
            prompt: prompts.load_prompt("review")?,
            tools: tools(&["Read", "Write", "Glob", "Grep", "WebSearch"]),
            model,
        },
    );

    Ok(AgentOptions {
        allowed_tools: tools(&["Read", "Write", "Glob", "Grep", "TaskOutput", "Task"]),
        permission_mode: PermissionMode::AcceptEdits,
        cwd: std::env::current_dir()?,
        system_prompt: prompts.load_prompt("master")?,
        agents,
        hooks: vec![HookMatcher {
            event: HookEvent::PreToolUse,
            matcher: "Bash".to_string(),
            command: hook_command.to_string(),
        }],
    })
}

/// Build the planner agent that turns a user request into a plan file.
pub fn build_planner_agent(settings: &Settings, prompts: &Prompts) -> Result<AgentOptions> {
    std::fs::create_dir_all(settings.plans_dir())?;

    Ok(AgentOptions {
        allowed_tools: tools(&["Read", "Write", "Glob"]),
        permission_mode: PermissionMode::AcceptEdits,
        cwd: std::env::current_dir()?,
        system_prompt: prompts.load_prompt("planner")?,
        agents: BTreeMap::new(),
        hooks: Vec::new(),
    })
}
