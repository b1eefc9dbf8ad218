//! Prompt templates for the podcast agents.
//!
//! Prompts are Markdown files embedded at build time. Any of them can be
//! replaced by placing `<name>.md` in the custom prompts directory.

use super::Settings;
use crate::error::{PodcastError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Shared podcast description prepended to every prompt.
pub const CONTEXT_PROMPT: &str = "about_podcast";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("about_podcast", include_str!("../../prompts/about_podcast.md")),
    ("master", include_str!("../../prompts/master.md")),
    ("planner", include_str!("../../prompts/planner.md")),
    ("transcribe", include_str!("../../prompts/transcribe.md")),
    ("modify", include_str!("../../prompts/modify.md")),
    ("review", include_str!("../../prompts/review.md")),
];

/// Collection of all prompt templates.
#[derive(Debug, Clone)]
pub struct Prompts {
    templates: HashMap<String, String>,
    /// Variables substituted into prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            templates: BUILTIN_PROMPTS
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_string()))
                .collect(),
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying overrides from `custom_dir` and custom variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            for (name, _) in BUILTIN_PROMPTS {
                let path = custom_path.join(format!("{}.md", name));
                if path.exists() {
                    let content = std::fs::read_to_string(&path)?;
                    prompts.templates.insert(name.to_string(), content);
                }
            }
        }

        Ok(prompts)
    }

    /// Load prompts for the given settings.
    ///
    /// Directory layout variables are always defined and take precedence over
    /// user variables of the same name.
    pub fn for_settings(settings: &Settings) -> Result<Self> {
        let mut prompts = Self::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let layout = [
            ("audio_dir", settings.audio_dir()),
            ("transcripts_dir", settings.transcripts_dir()),
            ("modified_transcripts_dir", settings.modified_transcripts_dir()),
            ("reviews_dir", settings.reviews_dir()),
            ("plans_dir", settings.plans_dir()),
            ("episode_assets_dir", settings.episode_assets_dir()),
        ];
        for (key, path) in layout {
            prompts
                .variables
                .insert(key.to_string(), path.display().to_string());
        }
        prompts.variables.insert(
            "transcribe_command".to_string(),
            settings.agent.transcribe_command.clone(),
        );

        Ok(prompts)
    }

    /// Raw template by name.
    pub fn template(&self, name: &str) -> Result<&str> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PodcastError::PromptNotFound(name.to_string()))
    }

    /// Load a rendered prompt with the podcast context prepended.
    pub fn load_prompt(&self, name: &str) -> Result<String> {
        let prompt = Self::render(self.template(name)?.trim(), &self.variables);
        let context = Self::render(self.template(CONTEXT_PROMPT)?.trim(), &self.variables);
        Ok(format!("About this Podcast: {}\n\n---\n\n{}", context, prompt))
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prompts_present() {
        let prompts = Prompts::default();
        for name in ["about_podcast", "master", "planner", "transcribe", "modify", "review"] {
            assert!(!prompts.template(name).unwrap().trim().is_empty(), "{} is empty", name);
        }
    }

    #[test]
    fn test_load_prompt_prepends_context() {
        let prompts = Prompts::default();
        let prompt = prompts.load_prompt("modify").unwrap();
        let context = prompts.template(CONTEXT_PROMPT).unwrap().trim();
        let body = prompts.template("modify").unwrap().trim();

        assert!(prompt.starts_with(&format!("About this Podcast: {}", context)));
        assert!(prompt.contains("\n\n---\n\n"));
        assert!(prompt.ends_with(body.lines().last().unwrap()));
    }

    #[test]
    fn test_unknown_prompt() {
        let prompts = Prompts::default();
        assert!(matches!(
            prompts.load_prompt("publish"),
            Err(PodcastError::PromptNotFound(name)) if name == "publish"
        ));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_custom_dir_overrides_single_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("review.md"), "  Review {{show}} carefully.\n").unwrap();
        std::fs::write(dir.path().join("about_podcast.md"), "A show about {{topic}}.").unwrap();

        let mut vars = HashMap::new();
        vars.insert("show".to_string(), "episode".to_string());
        vars.insert("topic".to_string(), "compilers".to_string());

        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();
        assert_eq!(
            prompts.load_prompt("review").unwrap(),
            "About this Podcast: A show about compilers.\n\n---\n\nReview episode carefully."
        );
        assert_eq!(
            prompts.template("modify").unwrap(),
            Prompts::default().template("modify").unwrap()
        );
    }

    #[test]
    fn test_layout_variables_win_over_user_variables() {
        let mut settings = Settings::default();
        settings
            .prompts
            .variables
            .insert("plans_dir".to_string(), "/elsewhere".to_string());

        let prompts = Prompts::for_settings(&settings).unwrap();
        let planner = prompts.load_prompt("planner").unwrap();

        assert!(planner.contains("./output/plans/plan_"));
        assert!(!planner.contains("/elsewhere"));
        assert!(!planner.contains("{{"));
    }
}
