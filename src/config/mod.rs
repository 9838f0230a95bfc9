//! Configuration module for Filewright.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::AgentPrompts;
pub use settings::{
    AgentOverride, GeneralSettings, ModelConfig, ModelSettings, OpenAiSettings, ProgramSettings,
    PromptSettings, Settings,
};
