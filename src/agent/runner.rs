//! Client for the hosted agent runtime, driven through its CLI.

use super::definition::AgentOptions;
use super::events::{CliEvent, ContentBlock};
use crate::error::{PodcastError, Result};
use async_trait::async_trait;
use console::style;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Something that can run one agent session to completion.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Run an agent with the given options on a single prompt.
    async fn run(&self, options: &AgentOptions, prompt: &str) -> Result<AgentRun>;
}

/// Outcome of a finished agent session.
#[derive(Debug, Clone, Default)]
pub struct AgentRun {
    pub session_id: String,
    /// Paths passed to `Write` tool calls, in call order.
    pub written_files: Vec<PathBuf>,
    /// Final result text reported by the runtime.
    pub final_text: Option<String>,
    pub num_turns: Option<u32>,
    pub total_cost_usd: Option<f64>,
}

/// Folds streamed runtime events into an [`AgentRun`].
#[derive(Debug, Default)]
pub struct RunRecorder {
    run: AgentRun,
    failure: Option<String>,
}

impl RunRecorder {
    pub fn new(session_id: &str) -> Self {
        Self {
            run: AgentRun {
                session_id: session_id.to_string(),
                ..Default::default()
            },
            failure: None,
        }
    }

    pub fn record(&mut self, event: CliEvent) {
        match event {
            CliEvent::System(sys) => {
                debug!(
                    "Agent session initialized: subtype={}, session_id={:?}, agents={:?}",
                    sys.subtype, sys.session_id, sys.agents
                );
                if let Some(id) = sys.session_id {
                    self.run.session_id = id;
                }
            }
            CliEvent::Assistant(evt) => {
                for block in &evt.message.content {
                    if let ContentBlock::ToolUse { name, input, .. } = block {
                        debug!("Tool use: {}", describe_tool_use(name, input));
                    }
                    if let Some(path) = block.written_file() {
                        info!("Agent wrote {}", path.display());
                        self.run.written_files.push(path);
                    }
                }
            }
            CliEvent::User(evt) => {
                for block in &evt.message.content {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        is_error: true,
                        content,
                    } = block
                    {
                        warn!("Tool {} failed: {}", tool_use_id, content);
                    }
                }
            }
            CliEvent::Result(res) => {
                info!(
                    "Agent run finished: subtype={}, turns={:?}, cost={:?}, duration_ms={:?}",
                    res.subtype, res.num_turns, res.total_cost_usd, res.duration_ms
                );
                self.run.num_turns = res.num_turns;
                self.run.total_cost_usd = res.total_cost_usd;
                if res.is_error {
                    self.failure = Some(res.error_message());
                } else {
                    self.run.final_text = res.result;
                }
            }
            CliEvent::Other => {}
        }
    }

    /// Complete the run once the runtime process has exited.
    pub fn finish(self, exited_ok: bool, stderr: &str) -> Result<AgentRun> {
        if let Some(message) = self.failure {
            return Err(PodcastError::AgentRuntime(message));
        }
        if !exited_ok {
            let detail = stderr.trim();
            return Err(PodcastError::AgentRuntime(if detail.is_empty() {
                "runtime exited with non-zero status".to_string()
            } else {
                format!("runtime exited with error: {}", detail)
            }));
        }
        Ok(self.run)
    }
}

/// Runs agents through the runtime CLI in `--print --output-format stream-json` mode.
pub struct ClaudeCliRunner {
    cli_path: String,
    echo: bool,
    envs: Vec<(String, String)>,
}

impl ClaudeCliRunner {
    pub fn new(cli_path: &str) -> Self {
        Self {
            cli_path: cli_path.to_string(),
            echo: true,
            envs: Vec::new(),
        }
    }

    /// Extra environment for the runtime process, inherited by its hooks and tools.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Print assistant messages to the terminal as they stream in.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

#[async_trait]
impl AgentRunner for ClaudeCliRunner {
    async fn run(&self, options: &AgentOptions, prompt: &str) -> Result<AgentRun> {
        let session_id = Uuid::new_v4().to_string();

        let mut cmd = Command::new(&self.cli_path);
        cmd.current_dir(&options.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .arg("--print")
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--session-id")
            .arg(&session_id)
            .args(options.to_cli_args()?);

        info!(
            "Spawning agent runtime: cli={}, cwd={}, session_id={}, subagents={:?}",
            self.cli_path,
            options.cwd.display(),
            session_id,
            options.agents.keys().collect::<Vec<_>>()
        );

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PodcastError::ToolNotFound(self.cli_path.clone()),
            _ => PodcastError::AgentRuntime(format!(
                "Failed to spawn '{}': {}",
                self.cli_path, e
            )),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PodcastError::AgentRuntime("Failed to capture runtime stdout".into()))?;
        let stderr = child.stderr.take();

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(stderr) = stderr {
                let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            }
            buf
        });

        let mut recorder = RunRecorder::new(&session_id);
        let mut lines = BufReader::new(stdout).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<CliEvent>(line) {
                Ok(event) => {
                    if self.echo {
                        echo_event(&event);
                    }
                    recorder.record(event);
                }
                Err(e) => {
                    let preview: String = line.chars().take(200).collect();
                    warn!("Failed to parse runtime event: {} - line: {}", e, preview);
                }
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();
        if !status.success() {
            warn!("Agent runtime exited with status: {}", status);
        }

        recorder.finish(status.success(), &stderr)
    }
}

/// Print an event for the user. Subagent output is dimmed.
fn echo_event(event: &CliEvent) {
    let CliEvent::Assistant(evt) = event else {
        return;
    };
    let nested = evt.parent_tool_use_id.is_some();

    for block in &evt.message.content {
        match block {
            ContentBlock::Text { text } if nested => println!("{}", style(text).dim()),
            ContentBlock::Text { text } => println!("{}", text),
            ContentBlock::ToolUse { name, input, .. } => println!(
                "  {} {}",
                style("->").cyan(),
                style(describe_tool_use(name, input)).dim()
            ),
            _ => {}
        }
    }
}

/// One-line summary of a tool call.
fn describe_tool_use(name: &str, input: &Value) -> String {
    let field = |key: &str| input.get(key).and_then(|v| v.as_str());

    match name {
        "Task" => format!("Task({})", field("subagent_type").unwrap_or("?")),
        "Bash" => format!("Bash: {}", field("command").unwrap_or_default()),
        "Read" | "Write" | "Edit" => {
            format!("{} {}", name, field("file_path").unwrap_or_default())
        }
        "Glob" | "Grep" => format!("{} {}", name, field("pattern").unwrap_or_default()),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> CliEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_recorder_collects_written_files_in_order() {
        let mut recorder = RunRecorder::new("local");
        recorder.record(event(r#"{"type":"system","subtype":"init","session_id":"s-1"}"#));
        recorder.record(event(r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"1","name":"Glob","input":{"pattern":"audio/*.wav"}}]}}"#));
        recorder.record(event(r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"2","name":"Write","input":{"file_path":"output/plans/plan_a.md","content":"x"}}]}}"#));
        recorder.record(event(r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"3","name":"Write","input":{"file_path":"output/plans/plan_b.md","content":"y"}}]}}"#));
        recorder.record(event(r#"{"type":"result","subtype":"success","result":"Plan written","is_error":false,"num_turns":4,"total_cost_usd":0.12}"#));

        let run = recorder.finish(true, "").unwrap();
        assert_eq!(run.session_id, "s-1");
        assert_eq!(
            run.written_files,
            vec![
                PathBuf::from("output/plans/plan_a.md"),
                PathBuf::from("output/plans/plan_b.md")
            ]
        );
        assert_eq!(run.final_text.as_deref(), Some("Plan written"));
        assert_eq!(run.num_turns, Some(4));
    }

    #[test]
    fn test_recorder_error_result() {
        let mut recorder = RunRecorder::new("s");
        recorder.record(event(r#"{"type":"result","subtype":"error_during_execution","is_error":true,"result":"API overloaded"}"#));
        let err = recorder.finish(true, "").unwrap_err();
        assert!(matches!(err, PodcastError::AgentRuntime(msg) if msg == "API overloaded"));
    }

    #[test]
    fn test_recorder_nonzero_exit() {
        let recorder = RunRecorder::new("s");
        let err = recorder.finish(false, "  invalid --agents json\n").unwrap_err();
        assert!(err.to_string().contains("invalid --agents json"));

        let err = RunRecorder::new("s").finish(false, "").unwrap_err();
        assert!(err.to_string().contains("non-zero status"));
    }

    #[test]
    fn test_describe_tool_use() {
        let input = serde_json::json!({"subagent_type": "transcribe", "prompt": "episode 12"});
        assert_eq!(describe_tool_use("Task", &input), "Task(transcribe)");

        let input = serde_json::json!({"command": "podcast-agents transcribe -n 12"});
        assert_eq!(describe_tool_use("Bash", &input), "Bash: podcast-agents transcribe -n 12");

        let input = serde_json::json!({"file_path": "output/reviews/12.md"});
        assert_eq!(describe_tool_use("Write", &input), "Write output/reviews/12.md");

        assert_eq!(describe_tool_use("WebSearch", &serde_json::json!({})), "WebSearch");
    }

    #[tokio::test]
    async fn test_missing_cli_reports_tool_not_found() {
        let runner = ClaudeCliRunner::new("/nonexistent/agent-runtime-cli").with_echo(false);
        let options = AgentOptions {
            allowed_tools: vec!["Read".to_string()],
            permission_mode: Default::default(),
            cwd: std::env::temp_dir(),
            system_prompt: "test".to_string(),
            agents: Default::default(),
            hooks: Vec::new(),
        };

        let err = runner.run(&options, "hello").await.unwrap_err();
        assert!(matches!(err, PodcastError::ToolNotFound(path) if path == "/nonexistent/agent-runtime-cli"));
    }
}
