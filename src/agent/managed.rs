//! Agents exposed to other agents as tools.

use super::descriptor::AgentDescriptor;
use super::runner::Agent;
use crate::tools::{ParamType, ToolDescriptor, ToolError, ToolResult, ToolSchema, TypedTool};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Arguments a parent agent passes to a managed sub-agent.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagedArgs {
    pub task: String,
    #[serde(default)]
    pub additional_args: Option<Value>,
}

fn schema() -> ToolSchema {
    ToolSchema::new()
        .required(
            "task",
            ParamType::String,
            "Long detailed description of the task.",
        )
        .optional(
            "additional_args",
            ParamType::Object,
            "Dictionary of extra inputs to pass to the managed agent, e.g. file paths or options.",
        )
}

fn tool_descriptor(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description, schema())
}

/// Tool descriptor under which a sub-agent is offered to its parent.
pub fn describe(agent: &AgentDescriptor) -> ToolDescriptor {
    tool_descriptor(&agent.name, &agent.description)
}

/// A sub-agent wrapped as a tool.
///
/// Running it runs the whole sub-agent to completion and returns its final
/// answer. Failures of the sub-agent come back as tool failures.
pub struct ManagedAgent {
    agent: Arc<Agent>,
}

impl ManagedAgent {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }

    fn task_text(args: &ManagedArgs) -> String {
        match &args.additional_args {
            Some(extra) if !extra.is_null() && extra.as_object().map_or(true, |o| !o.is_empty()) => format!(
                "{}\n\nYou have been provided with these additional arguments, \
                 that you can access directly using the keys as variables:\n{}",
                args.task, extra
            ),
            _ => args.task.clone(),
        }
    }
}

#[async_trait]
impl TypedTool for ManagedAgent {
    type Args = ManagedArgs;

    fn descriptor(&self) -> ToolDescriptor {
        tool_descriptor(self.agent.name(), self.agent.description())
    }

    async fn run(&self, args: ManagedArgs) -> ToolResult {
        if args.task.trim().is_empty() {
            return Err(ToolError::InvalidArgument(
                "The task for a managed agent must not be empty.".to_string(),
            ));
        }

        info!("Delegating to {}", self.agent.name());
        let response = self
            .agent
            .run(&Self::task_text(&args))
            .await
            .map_err(|e| {
                ToolError::Generic(format!("Managed agent '{}' failed: {}", self.agent.name(), e))
            })?;

        Ok(format!(
            "Here is the final answer from your managed agent '{}':\n{}",
            self.agent.name(),
            response.content
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::descriptor::{AgentLimits, ModelRef};
    use crate::agent::model::Message;
    use crate::agent::runner::tests::{answer, call, ScriptedModel, ScriptedProvider};
    use crate::config::AgentPrompts;
    use crate::tools::filesystem::CopyFileTool;
    use crate::tools::ToolSet;
    use serde_json::json;
    use std::collections::HashMap;

    fn team() -> AgentDescriptor {
        let organizer = AgentDescriptor::tool_calling(
            "FileOrganizer",
            "Copies, moves and deletes files.",
            ModelRef::new("worker", 2048),
            ToolSet::new().with(CopyFileTool).unwrap(),
            AgentLimits {
                max_steps: 3,
                planning_interval: None,
            },
        );
        AgentDescriptor::orchestrator(
            "FileOrchestrator",
            "Delegates file tasks.",
            ModelRef::new("boss", 8096),
            vec![organizer],
            AgentLimits {
                max_steps: 5,
                planning_interval: None,
            },
        )
    }

    #[tokio::test]
    async fn test_orchestrator_delegates_to_sub_agent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        std::fs::write(&source, b"data").unwrap();
        let dest = dir.path().join("b.txt");

        let worker = ScriptedModel::new(vec![
            call(
                "w1",
                "copy_file_tool",
                json!({"source_path": source.to_str().unwrap(), "destination_path": dest.to_str().unwrap()}),
            ),
            answer("Copied a.txt to b.txt"),
        ]);
        let boss = ScriptedModel::new(vec![
            call(
                "b1",
                "FileOrganizer",
                json!({"task": "copy a.txt to b.txt", "additional_args": {"dir": "tmp"}}),
            ),
            answer("All done"),
        ]);
        let mut models = HashMap::new();
        models.insert("worker".to_string(), worker.clone());
        models.insert("boss".to_string(), boss.clone());

        let agent = Agent::build(&team(), &ScriptedProvider { models }, &AgentPrompts::default()).unwrap();
        assert_eq!(agent.tools().names(), vec!["FileOrganizer".to_string()]);

        let response = agent.run("please copy the file").await.unwrap();
        assert_eq!(response.content, "All done");
        assert_eq!(std::fs::read(&dest).unwrap(), b"data");
        assert!(response.tool_calls[0]
            .result
            .contains("final answer from your managed agent 'FileOrganizer':\nCopied a.txt to b.txt"));

        // The sub-agent saw the task together with the extra arguments.
        let worker_requests = worker.requests.lock().unwrap();
        let (first, tools) = &worker_requests[0];
        assert_eq!(tools, &vec!["copy_file_tool".to_string()]);
        assert!(matches!(&first[1], Message::User(task) if task.contains("copy a.txt to b.txt") && task.contains("\"dir\"")));
    }

    #[tokio::test]
    async fn test_sub_agent_failure_is_a_tool_failure() {
        // The worker never stops calling tools and runs out of steps.
        let worker = ScriptedModel::new(vec![
            call("w1", "copy_file_tool", json!({"source_path": "/nonexistent/x", "destination_path": "/tmp/y"})),
            call("w2", "copy_file_tool", json!({"source_path": "/nonexistent/x", "destination_path": "/tmp/y"})),
            call("w3", "copy_file_tool", json!({"source_path": "/nonexistent/x", "destination_path": "/tmp/y"})),
        ]);
        let boss = ScriptedModel::new(vec![
            call("b1", "FileOrganizer", json!({"task": "copy x"})),
            answer("The organizer could not finish"),
        ]);
        let mut models = HashMap::new();
        models.insert("worker".to_string(), worker);
        models.insert("boss".to_string(), boss);

        let agent = Agent::build(&team(), &ScriptedProvider { models }, &AgentPrompts::default()).unwrap();
        let response = agent.run("copy x").await.unwrap();

        assert!(response.tool_calls[0]
            .result
            .starts_with("Error: Managed agent 'FileOrganizer' failed"));
        assert_eq!(response.content, "The organizer could not finish");
    }

    #[test]
    fn test_task_text_without_extras() {
        let args = ManagedArgs {
            task: "rotate page 2".to_string(),
            additional_args: Some(json!({})),
        };
        assert_eq!(ManagedAgent::task_text(&args), "rotate page 2");
    }
}
