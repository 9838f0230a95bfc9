//! Agent composition and the tool calling loop.
//!
//! An [`AgentDescriptor`] binds a model, a tool set and step limits. The
//! orchestrator has no tools of its own; its sub-agents are offered to its
//! model as tools, so agents compose recursively.

pub mod catalog;
mod descriptor;
mod managed;
mod model;
mod runner;

pub use catalog::{AgentEntry, AgentRegistry};
pub use descriptor::{AgentDescriptor, AgentKind, AgentLimits, ModelRef};
pub use managed::{ManagedAgent, ManagedArgs};
pub use model::{
    tool_definitions, AssistantTurn, ChatModel, Message, ModelProvider, OpenAiChatModel,
    OpenAiProvider, ToolCallRequest,
};
pub use runner::{Agent, AgentResponse, ToolCallRecord};
