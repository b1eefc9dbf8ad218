//! Agent runtime integration.
//!
//! Builds the option sets for the planner and the production workflow,
//! drives the external agent runtime through its CLI, and provides the
//! PreToolUse hook that restricts which commands agents may execute.

mod definition;
mod events;
pub mod hook;
mod runner;

pub use definition::{
    build_planner_agent, build_workflow_agent, AgentDefinition, AgentOptions, HookEvent,
    HookMatcher, PermissionMode,
};
pub use events::{CliEvent, ContentBlock, ResultEvent};
pub use hook::{validate_bash_command, CommandPolicy, HookInput, HookOutput, PermissionDecision};
pub use runner::{AgentRun, AgentRunner, ClaudeCliRunner, RunRecorder};
