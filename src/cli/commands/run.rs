//! Run command - plan a production request, ask for approval, execute it.

use crate::agent::hook::hook_command;
use crate::agent::ClaudeCliRunner;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, CONFIG_ENV};
use crate::config::Settings;
use crate::workflow::{Plan, Workflow, WorkflowOutcome};
use anyhow::Result;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const EXAMPLE_REQUESTS: &[&str] = &[
    "Transcribe episode 12 and clean up the transcript",
    "Create a clean transcript for episode 5 and review it",
    "Review the modified transcript for episode 3",
];

/// Run the interactive plan-approve-execute workflow.
pub async fn run_workflow(settings: Settings, config: Option<&Path>) -> Result<()> {
    Output::banner("Tech Table Log - Interactive Podcast Production");
    println!("\nExamples:");
    for example in EXAMPLE_REQUESTS {
        Output::list_item(example);
    }
    println!();

    if let Err(e) = preflight::check(Operation::Workflow, &settings) {
        Output::error(&format!("Pre-flight check failed: {}", e));
        Output::info("Run 'podcast-agents doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let request = Output::prompt("Enter your request: ")?;
    let request = request.trim();
    if request.is_empty() {
        println!("No request provided. Exiting.");
        return Ok(());
    }

    let config = config.map(absolute).transpose()?;
    let exe = std::env::current_exe()?;
    let hook = hook_command(&exe, config.as_deref());

    let mut runner = ClaudeCliRunner::new(&settings.agent.cli_path);
    if let Some(config) = &config {
        runner = runner.with_env(CONFIG_ENV, config.to_string_lossy());
    }

    let workflow = Workflow::new(settings, Arc::new(runner), &hook)?;

    Output::banner("Tech Table Log - Interactive Workflow");
    println!("Analyzing request and creating plan...\n");

    let outcome = workflow.run_interactive(request, confirm_plan).await?;
    report(outcome);
    Ok(())
}

/// Show the plan and ask whether to go ahead. Only `y` approves.
fn confirm_plan(plan: &Plan) -> crate::Result<bool> {
    println!();
    Output::success(&format!("Plan saved to: {}", plan.path.display()));
    println!("\n{}", style("TODO List:").bold());
    Output::rule('-');
    println!("{}", plan.content.trim_end());
    Output::rule('-');
    println!();

    let answer = Output::prompt("Proceed with execution? (y/n): ")?;
    let approved = answer.trim().eq_ignore_ascii_case("y");
    if approved {
        Output::banner("Executing tasks...");
    }
    Ok(approved)
}

fn report(outcome: WorkflowOutcome) {
    match outcome {
        WorkflowOutcome::NoPlan => {
            Output::error("Failed to create execution plan. Please try again.");
        }
        WorkflowOutcome::PlanRejected(path) => {
            Output::error(&format!(
                "Plan path is outside the plans directory: {}",
                path.display()
            ));
        }
        WorkflowOutcome::PlanMissing(path) => {
            Output::error(&format!("Plan file not found at {}", path.display()));
        }
        WorkflowOutcome::Cancelled => {
            println!("Cancelled");
        }
        WorkflowOutcome::Completed(run) => {
            Output::banner("All tasks completed successfully!");
            if let Some(turns) = run.num_turns {
                Output::kv("Turns", &turns.to_string());
            }
            if let Some(cost) = run.total_cost_usd {
                Output::kv("Cost", &format!("${:.4}", cost));
            }
            info!("Workflow session {} completed", run.session_id);
        }
        WorkflowOutcome::Failed(message) => {
            Output::error(&format!("Workflow failed: {}", message));
        }
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
