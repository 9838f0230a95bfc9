//! Prompt templates for Filewright agents.
//!
//! Templates use `{{variable}}` placeholders and can be replaced from the
//! `[prompts]` section of the configuration file.

use super::PromptSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prompt templates used by the agent runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System prompt. Variables: `agent_name`, `agent_description`, `tool_list`.
    pub system: String,
    /// Planning prompt sent every `planning_interval` steps.
    /// Variables: `task`, `step`, `remaining_steps`.
    pub planning: String,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are {{agent_name}}: {{agent_description}}

You solve file-related tasks by calling the tools available to you. Each tool
returns a short text result. Results that start with "Error:" describe what
went wrong and usually how to fix it; read them and adjust your next call.

Available tools:
{{tool_list}}

Guidelines:
- Use exactly the parameter names each tool declares
- Use full file paths as given by the user; do not invent paths
- Never delete or overwrite files unless the task explicitly asks for it
- Call one tool at a time when a later call depends on an earlier result

When the task is complete, answer with a short summary of what was done and
where the resulting files are."#
                .to_string(),

            planning: r#"Before continuing, review the progress on the task below.

Task: {{task}}

List the facts you have established so far, then the remaining steps as a
numbered plan. You are at step {{step}} with {{remaining_steps}} step(s) left.
Do not call any tool in this answer."#
                .to_string(),

            variables: HashMap::new(),
        }
    }
}

impl AgentPrompts {
    /// Build prompts from settings, falling back to defaults.
    pub fn from_settings(settings: &PromptSettings) -> Self {
        let defaults = Self::default();
        Self {
            system: settings.system.clone().unwrap_or(defaults.system),
            planning: settings.planning.clone().unwrap_or(defaults.planning),
            variables: settings.variables.clone(),
        }
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        merged.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::render(template, &merged)
    }
}
