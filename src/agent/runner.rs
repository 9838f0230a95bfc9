//! Agent runner with tool calling loop.

use super::descriptor::{AgentDescriptor, AgentKind, AgentLimits};
use super::managed::ManagedAgent;
use super::model::{ChatModel, Message, ModelProvider, ToolCallRequest};
use crate::config::AgentPrompts;
use crate::error::{FilewrightError, Result};
use crate::tools::{encode, ToolDescriptor, ToolError, ToolSet};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A runnable agent: a model bound to a tool set and step limits.
///
/// Managed sub-agents are already wrapped as tools in `tools`.
pub struct Agent {
    name: String,
    description: String,
    kind: AgentKind,
    model: Arc<dyn ChatModel>,
    tools: ToolSet,
    limits: AgentLimits,
    prompts: AgentPrompts,
}

impl Agent {
    /// Build an agent, and recursively its managed sub-agents.
    pub fn build(
        descriptor: &AgentDescriptor,
        provider: &dyn ModelProvider,
        prompts: &AgentPrompts,
    ) -> Result<Self> {
        descriptor.validate()?;

        let mut tools = descriptor.tools.clone();
        for sub in &descriptor.managed {
            let agent = Agent::build(sub, provider, prompts)?;
            tools.register(Arc::new(ManagedAgent::new(Arc::new(agent))))?;
        }

        Ok(Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            kind: descriptor.kind,
            model: provider.model(&descriptor.model)?,
            tools,
            limits: descriptor.limits,
            prompts: prompts.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Render the system prompt for this agent.
    pub fn system_prompt(&self) -> String {
        let tool_list = self
            .tools
            .descriptors()
            .iter()
            .map(|tool| format!("- {}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("agent_name".to_string(), self.name.clone());
        vars.insert("agent_description".to_string(), self.description.clone());
        vars.insert("tool_list".to_string(), tool_list);
        self.prompts.render_with_custom(&self.prompts.system, &vars)
    }

    fn planning_prompt(&self, task: &str, step: usize) -> String {
        let mut vars = HashMap::new();
        vars.insert("task".to_string(), task.to_string());
        vars.insert("step".to_string(), step.to_string());
        vars.insert(
            "remaining_steps".to_string(),
            (self.limits.max_steps + 1 - step).to_string(),
        );
        self.prompts.render_with_custom(&self.prompts.planning, &vars)
    }

    /// Whether a planning refresh happens before `step` (1-based).
    fn plans_before(&self, step: usize) -> bool {
        matches!(self.limits.planning_interval, Some(n) if n > 0 && (step - 1) % n == 0)
    }

    /// Run the agent on a task until the model answers without tool calls.
    pub async fn run(&self, task: &str) -> Result<AgentResponse> {
        info!(agent = %self.name, "Starting run");

        let mut messages = vec![
            Message::System(self.system_prompt()),
            Message::User(task.to_string()),
        ];
        let callables: Vec<ToolDescriptor> = self.tools.descriptors();
        let mut tool_calls_made = Vec::new();
        let mut plans = 0;

        for step in 1..=self.limits.max_steps {
            if self.plans_before(step) {
                let prompt = self.planning_prompt(task, step);
                let mut request = messages.clone();
                request.push(Message::User(prompt.clone()));

                let plan = self.model.complete(&request, &[]).await?;
                let plan = plan.content.unwrap_or_default();
                debug!(agent = %self.name, step, "Updated plan:\n{}", plan);

                messages.push(Message::User(prompt));
                messages.push(Message::assistant_text(plan));
                plans += 1;
            }

            debug!(agent = %self.name, "Agent step {}", step);

            let turn = self.model.complete(&messages, &callables).await?;
            if turn.tool_calls.is_empty() {
                info!(agent = %self.name, steps = step, "Finished");
                return Ok(AgentResponse {
                    content: turn.content.unwrap_or_default(),
                    tool_calls: tool_calls_made,
                    steps: step,
                    plans,
                });
            }

            messages.push(Message::Assistant {
                content: turn.content.clone(),
                tool_calls: turn.tool_calls.clone(),
            });

            for call in &turn.tool_calls {
                let record = self.execute_tool_call(call).await;
                messages.push(Message::Tool {
                    call_id: call.id.clone(),
                    content: record.result.clone(),
                });
                tool_calls_made.push(record);
            }
        }

        Err(FilewrightError::Agent(format!(
            "Agent '{}' exceeded maximum steps ({})",
            self.name, self.limits.max_steps
        )))
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, call: &ToolCallRequest) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let result = match parse_arguments(&call.arguments) {
            Ok(args) => self.tools.dispatch(&call.name, args).await,
            Err(e) => {
                warn!("Unparseable arguments for {}: {}", call.name, e);
                Err(e)
            }
        };

        ToolCallRecord {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result: encode(&result),
        }
    }
}

/// Decode the model's JSON arguments; an empty string means no arguments.
fn parse_arguments(raw: &str) -> std::result::Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw)
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid arguments: {}", e)))
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of steps (tool-enabled model calls) used.
    pub steps: usize,
    /// Number of planning refreshes.
    pub plans: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Encoded result returned to the model.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::descriptor::ModelRef;
    use crate::agent::model::AssistantTurn;
    use crate::tools::filesystem::DeleteFileTool;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A model that replays scripted turns and records what it was sent.
    pub(crate) struct ScriptedModel {
        turns: Mutex<VecDeque<AssistantTurn>>,
        pub(crate) requests: Mutex<Vec<(Vec<Message>, Vec<String>)>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(turns: Vec<AssistantTurn>) -> Arc<Self> {
            Arc::new(Self {
                turns: Mutex::new(turns.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn tool_names_seen(&self) -> Vec<Vec<String>> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, tools)| tools.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<AssistantTurn> {
            self.requests.lock().unwrap().push((
                messages.to_vec(),
                tools.iter().map(|t| t.name.clone()).collect(),
            ));
            Ok(self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| AssistantTurn {
                    content: Some("script exhausted".to_string()),
                    tool_calls: Vec::new(),
                }))
        }
    }

    /// Hands out scripted models by model name.
    pub(crate) struct ScriptedProvider {
        pub(crate) models: HashMap<String, Arc<ScriptedModel>>,
    }

    impl ModelProvider for ScriptedProvider {
        fn model(&self, model: &ModelRef) -> Result<Arc<dyn ChatModel>> {
            self.models
                .get(&model.name)
                .cloned()
                .map(|m| m as Arc<dyn ChatModel>)
                .ok_or_else(|| FilewrightError::Config(format!("no scripted model '{}'", model.name)))
        }
    }

    pub(crate) fn call(id: &str, name: &str, arguments: Value) -> AssistantTurn {
        AssistantTurn {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }

    pub(crate) fn answer(text: &str) -> AssistantTurn {
        AssistantTurn {
            content: Some(text.to_string()),
            tool_calls: Vec::new(),
        }
    }

    fn organizer(model: &str, limits: AgentLimits) -> AgentDescriptor {
        AgentDescriptor::tool_calling(
            "FileOrganizer",
            "Organizes files.",
            ModelRef::new(model, 2048),
            ToolSet::new().with(DeleteFileTool).unwrap(),
            limits,
        )
    }

    fn provider(name: &str, model: &Arc<ScriptedModel>) -> ScriptedProvider {
        let mut models = HashMap::new();
        models.insert(name.to_string(), model.clone());
        ScriptedProvider { models }
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "delete_file_tool".to_string(),
            arguments: r#"{"file_path": "a.txt"}"#.to_string(),
            result: "File 'a.txt' successfully deleted.".to_string(),
        };
        assert_eq!(format!("{}", record), r#"delete_file_tool({"file_path": "a.txt"})"#);
    }

    #[tokio::test]
    async fn test_tool_results_are_fed_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("old.log");
        std::fs::write(&file, b"x").unwrap();
        let path = file.to_str().unwrap();

        let model = ScriptedModel::new(vec![
            call("c1", "delete_file_tool", serde_json::json!({"file_path": path})),
            call("c2", "delete_file_tool", serde_json::json!({"file_path": path, "confirm": true})),
            answer("Deleted old.log"),
        ]);
        let limits = AgentLimits {
            max_steps: 5,
            planning_interval: None,
        };
        let agent = Agent::build(
            &organizer("m", limits),
            &provider("m", &model),
            &AgentPrompts::default(),
        )
        .unwrap();

        let response = agent.run("delete old.log").await.unwrap();
        assert_eq!(response.content, "Deleted old.log");
        assert_eq!(response.steps, 3);
        assert_eq!(response.tool_calls.len(), 2);
        assert!(response.tool_calls[0].result.starts_with("Error: Deletion requires confirmation"));
        assert!(response.tool_calls[1].result.contains("successfully deleted"));
        assert!(!file.exists());

        let requests = model.requests.lock().unwrap();
        let (last_messages, _) = requests.last().unwrap();
        assert!(matches!(&last_messages[0], Message::System(s) if s.contains("delete_file_tool")));
        assert!(matches!(
            last_messages.last().unwrap(),
            Message::Tool { call_id, .. } if call_id == "c2"
        ));
    }

    #[tokio::test]
    async fn test_bad_arguments_and_unknown_tools_do_not_abort() {
        let model = ScriptedModel::new(vec![
            AssistantTurn {
                content: None,
                tool_calls: vec![
                    ToolCallRequest {
                        id: "c1".to_string(),
                        name: "delete_file_tool".to_string(),
                        arguments: "{not json".to_string(),
                    },
                    ToolCallRequest {
                        id: "c2".to_string(),
                        name: "format_disk_tool".to_string(),
                        arguments: "{}".to_string(),
                    },
                ],
            },
            answer("gave up"),
        ]);
        let limits = AgentLimits {
            max_steps: 5,
            planning_interval: None,
        };
        let agent = Agent::build(&organizer("m", limits), &provider("m", &model), &AgentPrompts::default())
            .unwrap();

        let response = agent.run("do something").await.unwrap();
        assert!(response.tool_calls[0].result.starts_with("Error: Invalid arguments"));
        assert!(response.tool_calls[1].result.contains("Unknown tool 'format_disk_tool'"));
        assert_eq!(response.content, "gave up");
    }

    #[tokio::test]
    async fn test_max_steps_exceeded() {
        let model = ScriptedModel::new(vec![
            call("c1", "delete_file_tool", serde_json::json!({"file_path": "/nonexistent/a"})),
            call("c2", "delete_file_tool", serde_json::json!({"file_path": "/nonexistent/b"})),
        ]);
        let limits = AgentLimits {
            max_steps: 2,
            planning_interval: None,
        };
        let agent = Agent::build(&organizer("m", limits), &provider("m", &model), &AgentPrompts::default())
            .unwrap();

        let err = agent.run("loop forever").await.unwrap_err();
        assert!(err.to_string().contains("exceeded maximum steps (2)"));
    }

    #[tokio::test]
    async fn test_planning_interval() {
        let model = ScriptedModel::new(vec![
            answer("plan 1"),
            call("c1", "delete_file_tool", serde_json::json!({"file_path": "/nonexistent/a"})),
            call("c2", "delete_file_tool", serde_json::json!({"file_path": "/nonexistent/b"})),
            answer("plan 2"),
            answer("done"),
        ]);
        let limits = AgentLimits {
            max_steps: 10,
            planning_interval: Some(2),
        };
        let agent = Agent::build(&organizer("m", limits), &provider("m", &model), &AgentPrompts::default())
            .unwrap();

        let response = agent.run("clean up").await.unwrap();
        assert_eq!(response.content, "done");
        assert_eq!(response.steps, 3);
        assert_eq!(response.plans, 2);

        // Planning calls are made without tools.
        let tools = model.tool_names_seen();
        assert_eq!(tools.len(), 5);
        assert!(tools[0].is_empty());
        assert_eq!(tools[1], vec!["delete_file_tool".to_string()]);
        assert!(tools[3].is_empty());
    }
}
