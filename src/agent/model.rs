//! The planner boundary: chat models that can request tool calls.

use super::descriptor::ModelRef;
use crate::error::{FilewrightError, Result};
use crate::tools::ToolDescriptor;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// One entry of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

impl Message {
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// The model's reply to one completion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// A chat model that may answer with text or with tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Complete the conversation. An empty `tools` slice disables tool calls.
    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<AssistantTurn>;
}

/// Supplies a chat model for a model reference.
pub trait ModelProvider: Send + Sync {
    fn model(&self, model: &ModelRef) -> Result<Arc<dyn ChatModel>>;
}

/// Chat completions through the OpenAI API.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: ModelRef,
}

impl OpenAiChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: ModelRef) -> Self {
        Self { client, model }
    }
}

fn build_error(e: impl std::fmt::Display) -> FilewrightError {
    FilewrightError::Agent(e.to_string())
}

/// Tool definitions in the OpenAI function-calling format.
pub fn tool_definitions(tools: &[ToolDescriptor]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.inputs.to_json_schema()),
                strict: None,
            },
        })
        .collect()
}

fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let converted = match message {
        Message::System(content) => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        Message::User(content) => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(content) = content {
                args.content(content.clone());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build().map_err(build_error)?.into()
        }
        Message::Tool { call_id, content } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(call_id.clone())
            .content(content.clone())
            .build()
            .map_err(build_error)?
            .into(),
    };
    Ok(converted)
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model.name
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<AssistantTurn> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model.name)
            .messages(messages)
            .max_completion_tokens(self.model.max_tokens);
        if !tools.is_empty() {
            request.tools(tool_definitions(tools));
        }
        let request = request.build().map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| FilewrightError::OpenAI(format!("Agent API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| FilewrightError::Agent("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(AssistantTurn {
            content: choice.message.content,
            tool_calls,
        })
    }
}

/// Builds OpenAI chat models sharing one client.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }
}

impl ModelProvider for OpenAiProvider {
    fn model(&self, model: &ModelRef) -> Result<Arc<dyn ChatModel>> {
        Ok(Arc::new(OpenAiChatModel::new(self.client.clone(), model.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamType, ToolSchema};

    #[test]
    fn test_tool_definitions_carry_schema() {
        let descriptor = ToolDescriptor::new(
            "delete_file_tool",
            "Deletes a file.",
            ToolSchema::new()
                .required("file_path", ParamType::String, "Path.")
                .optional("confirm", ParamType::Boolean, "Confirm."),
        );

        let defs = tool_definitions(&[descriptor]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].function.name, "delete_file_tool");
        let params = defs[0].function.parameters.as_ref().unwrap();
        assert_eq!(params["type"], "object");
        assert_eq!(params["required"], serde_json::json!(["file_path"]));
    }

    #[test]
    fn test_assistant_message_with_tool_calls_converts() {
        let message = Message::Assistant {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "copy_file_tool".to_string(),
                arguments: "{}".to_string(),
            }],
        };
        assert!(matches!(
            to_request_message(&message).unwrap(),
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }
}
