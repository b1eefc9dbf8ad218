//! Plan, approve, execute.
//!
//! The planner agent turns a free-text request into a plan file under the
//! plans directory. After the user approves the plan, the workflow agent
//! carries it out by delegating to the transcribe, modify and review
//! subagents.

use crate::agent::{build_planner_agent, build_workflow_agent, AgentRun, AgentRunner};
use crate::config::{Prompts, Settings};
use crate::error::{PodcastError, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A plan file ready for review.
#[derive(Debug, Clone)]
pub struct Plan {
    pub path: PathBuf,
    pub content: String,
}

/// How an interactive run ended.
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// The planner finished without writing a plan file.
    NoPlan,
    /// The planner wrote outside the plans directory.
    PlanRejected(PathBuf),
    /// The reported plan file does not exist.
    PlanMissing(PathBuf),
    /// The user declined the plan.
    Cancelled,
    Completed(AgentRun),
    Failed(String),
}

/// Coordinates the planner and workflow agents.
pub struct Workflow {
    settings: Settings,
    prompts: Prompts,
    runner: Arc<dyn AgentRunner>,
    hook_command: String,
    cwd: PathBuf,
}

impl Workflow {
    /// Create a workflow rooted at the current directory.
    pub fn new(settings: Settings, runner: Arc<dyn AgentRunner>, hook_command: &str) -> Result<Self> {
        let prompts = Prompts::for_settings(&settings)?;
        Ok(Self {
            settings,
            prompts,
            runner,
            hook_command: hook_command.to_string(),
            cwd: std::env::current_dir()?,
        })
    }

    /// Run agents in, and resolve relative paths against, `cwd`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Ask the planner for a plan. Returns the first file it wrote, if any.
    pub async fn plan(&self, request: &str) -> Result<Option<PathBuf>> {
        let mut options = build_planner_agent(&self.settings, &self.prompts)?;
        options.cwd = self.cwd.clone();

        info!("Planning request: {}", request);
        let run = self.runner.run(&options, request).await?;

        if run.written_files.len() > 1 {
            warn!(
                "Planner wrote {} files, using the first: {:?}",
                run.written_files.len(),
                run.written_files
            );
        }
        Ok(run.written_files.into_iter().next())
    }

    /// Resolve a plan path and confine it to the plans directory.
    pub fn validate_plan_path(&self, path: &Path) -> Result<PathBuf> {
        let plans_dir = normalize(&self.cwd, &self.settings.plans_dir());
        let resolved = normalize(&self.cwd, path);

        if resolved.parent() != Some(plans_dir.as_path()) {
            return Err(PodcastError::PlanOutsideDirectory(path.to_path_buf()));
        }

        // A symlink inside the plans directory must not point elsewhere.
        if resolved.exists() {
            let canonical = resolved.canonicalize()?;
            let canonical_dir = plans_dir.canonicalize()?;
            if canonical.parent() != Some(canonical_dir.as_path()) {
                return Err(PodcastError::PlanOutsideDirectory(path.to_path_buf()));
            }
        }

        Ok(resolved)
    }

    /// Read a validated plan file.
    pub fn read_plan(&self, path: &Path) -> Result<Plan> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Plan {
                path: path.to_path_buf(),
                content,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PodcastError::PlanNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Have the workflow agent carry out an approved plan.
    pub async fn execute(&self, plan: &Plan) -> Result<AgentRun> {
        let mut options = build_workflow_agent(&self.settings, &self.prompts, &self.hook_command)?;
        options.cwd = self.cwd.clone();

        info!("Executing plan {}", plan.path.display());
        self.runner
            .run(&options, &format!("Please execute the plan at {}", plan.path.display()))
            .await
    }

    /// Plan, ask `approve` for confirmation, then execute.
    ///
    /// Planner failures are returned as errors; execution failures are
    /// reported through [`WorkflowOutcome::Failed`].
    pub async fn run_interactive<F>(&self, request: &str, approve: F) -> Result<WorkflowOutcome>
    where
        F: FnOnce(&Plan) -> Result<bool>,
    {
        let Some(plan_path) = self.plan(request).await? else {
            return Ok(WorkflowOutcome::NoPlan);
        };

        let resolved = match self.validate_plan_path(&plan_path) {
            Ok(path) => path,
            Err(PodcastError::PlanOutsideDirectory(path)) => {
                warn!("Rejected plan outside plans directory: {}", path.display());
                return Ok(WorkflowOutcome::PlanRejected(path));
            }
            Err(e) => return Err(e),
        };

        let plan = match self.read_plan(&resolved) {
            Ok(plan) => plan,
            Err(PodcastError::PlanNotFound(path)) => return Ok(WorkflowOutcome::PlanMissing(path)),
            Err(e) => return Err(e),
        };

        if !approve(&plan)? {
            info!("Plan {} declined", plan.path.display());
            return Ok(WorkflowOutcome::Cancelled);
        }

        match self.execute(&plan).await {
            Ok(run) => Ok(WorkflowOutcome::Completed(run)),
            Err(e) => {
                error!("Workflow execution failed: {}", e);
                Ok(WorkflowOutcome::Failed(e.to_string()))
            }
        }
    }
}

/// Absolute, lexically normalised path (`.` and `..` folded, no filesystem access).
fn normalize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentOptions;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted runner: each call pops the next response and records the call.
    #[derive(Default)]
    struct FakeRunner {
        responses: Mutex<VecDeque<Result<AgentRun>>>,
        calls: Mutex<Vec<(AgentOptions, String)>>,
    }

    impl FakeRunner {
        fn with(responses: Vec<Result<AgentRun>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl AgentRunner for FakeRunner {
        async fn run(&self, options: &AgentOptions, prompt: &str) -> Result<AgentRun> {
            self.calls
                .lock()
                .unwrap()
                .push((options.clone(), prompt.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AgentRun::default()))
        }
    }

    fn wrote(paths: &[&str]) -> Result<AgentRun> {
        Ok(AgentRun {
            written_files: paths.iter().map(PathBuf::from).collect(),
            ..Default::default()
        })
    }

    fn setup(runner: Arc<FakeRunner>) -> (tempfile::TempDir, Workflow) {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let mut settings = Settings::default();
        settings.paths.output_dir = root.join("output").to_string_lossy().to_string();
        settings.paths.audio_dir = root.join("audio").to_string_lossy().to_string();

        let workflow = Workflow::new(settings, runner, "podcast-agents hook")
            .unwrap()
            .with_cwd(&root);
        (temp, workflow)
    }

    fn write_plan(workflow: &Workflow, name: &str, content: &str) -> PathBuf {
        let dir = workflow.settings.plans_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_normalize() {
        let base = Path::new("/work");
        assert_eq!(normalize(base, Path::new("output/plans/a.md")), PathBuf::from("/work/output/plans/a.md"));
        assert_eq!(normalize(base, Path::new("./output/../output/plans/a.md")), PathBuf::from("/work/output/plans/a.md"));
        assert_eq!(normalize(base, Path::new("/etc/passwd")), PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn test_plan_path_confinement() {
        let (_temp, workflow) = setup(FakeRunner::with(vec![]));
        let plans = workflow.settings.plans_dir();

        assert_eq!(
            workflow.validate_plan_path(&plans.join("plan_1.md")).unwrap(),
            plans.join("plan_1.md")
        );
        assert_eq!(
            workflow.validate_plan_path(Path::new("output/plans/plan_2.md")).unwrap(),
            plans.join("plan_2.md")
        );

        for bad in [
            PathBuf::from("/etc/passwd"),
            PathBuf::from("output/plans/../reviews/12.md"),
            PathBuf::from("output/plans/nested/plan.md"),
            PathBuf::from("output/plans"),
            PathBuf::from("plan.md"),
        ] {
            assert!(
                matches!(workflow.validate_plan_path(&bad), Err(PodcastError::PlanOutsideDirectory(_))),
                "{} accepted",
                bad.display()
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_symlink_escape_rejected() {
        let (temp, workflow) = setup(FakeRunner::with(vec![]));
        let secret = temp.path().join("secret.txt");
        std::fs::write(&secret, "token").unwrap();
        std::fs::create_dir_all(workflow.settings.plans_dir()).unwrap();
        let link = workflow.settings.plans_dir().join("plan_link.md");
        std::os::unix::fs::symlink(&secret, &link).unwrap();

        assert!(matches!(
            workflow.validate_plan_path(&link),
            Err(PodcastError::PlanOutsideDirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_full_run_executes_approved_plan() {
        let runner = FakeRunner::with(vec![wrote(&["output/plans/plan_20260101.md"]), wrote(&[])]);
        let (_temp, workflow) = setup(runner.clone());
        let plan_path = write_plan(&workflow, "plan_20260101.md", "## TODO\n- [ ] transcribe episode 12\n");

        let mut shown = String::new();
        let outcome = workflow
            .run_interactive("Transcribe episode 12", |plan| {
                shown = plan.content.clone();
                Ok(true)
            })
            .await
            .unwrap();

        assert!(matches!(outcome, WorkflowOutcome::Completed(_)));
        assert!(shown.contains("transcribe episode 12"));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);

        let (planner, request) = &calls[0];
        assert_eq!(request, "Transcribe episode 12");
        assert!(planner.agents.is_empty());
        assert_eq!(planner.cwd, workflow.cwd);

        let (executor, prompt) = &calls[1];
        assert_eq!(prompt, &format!("Please execute the plan at {}", plan_path.display()));
        assert_eq!(executor.agents.len(), 3);
        assert_eq!(executor.hooks[0].command, "podcast-agents hook");
    }

    #[tokio::test]
    async fn test_no_plan_written() {
        let runner = FakeRunner::with(vec![wrote(&[])]);
        let (_temp, workflow) = setup(runner.clone());

        let outcome = workflow
            .run_interactive("Review episode 14", |_| panic!("nothing to approve"))
            .await
            .unwrap();

        assert!(matches!(outcome, WorkflowOutcome::NoPlan));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_plan_outside_directory_is_not_executed() {
        let runner = FakeRunner::with(vec![wrote(&["/tmp/evil_plan.md"])]);
        let (_temp, workflow) = setup(runner.clone());

        let outcome = workflow
            .run_interactive("Process episode 12", |_| panic!("must not ask"))
            .await
            .unwrap();

        assert!(matches!(outcome, WorkflowOutcome::PlanRejected(p) if p == PathBuf::from("/tmp/evil_plan.md")));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_plan_file() {
        let runner = FakeRunner::with(vec![wrote(&["output/plans/ghost.md"])]);
        let (_temp, workflow) = setup(runner.clone());

        let outcome = workflow
            .run_interactive("Process episode 12", |_| panic!("must not ask"))
            .await
            .unwrap();

        assert!(matches!(outcome, WorkflowOutcome::PlanMissing(p) if p.ends_with("output/plans/ghost.md")));
    }

    #[tokio::test]
    async fn test_declined_plan() {
        let runner = FakeRunner::with(vec![wrote(&["output/plans/plan.md"])]);
        let (_temp, workflow) = setup(runner.clone());
        write_plan(&workflow, "plan.md", "- [ ] review episode 14");

        let outcome = workflow
            .run_interactive("Review episode 14", |_| Ok(false))
            .await
            .unwrap();

        assert!(matches!(outcome, WorkflowOutcome::Cancelled));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execution_failure_is_reported() {
        let runner = FakeRunner::with(vec![
            wrote(&["output/plans/plan.md"]),
            Err(PodcastError::AgentRuntime("rate limited".to_string())),
        ]);
        let (_temp, workflow) = setup(runner);
        write_plan(&workflow, "plan.md", "- [ ] modify episode 13");

        let outcome = workflow.run_interactive("Modify 13", |_| Ok(true)).await.unwrap();
        assert!(matches!(outcome, WorkflowOutcome::Failed(msg) if msg.contains("rate limited")));
    }

    #[tokio::test]
    async fn test_planner_failure_propagates() {
        let runner = FakeRunner::with(vec![Err(PodcastError::ToolNotFound("claude".to_string()))]);
        let (_temp, workflow) = setup(runner);

        let err = workflow.run_interactive("anything", |_| Ok(true)).await.unwrap_err();
        assert!(matches!(err, PodcastError::ToolNotFound(_)));
    }
}
