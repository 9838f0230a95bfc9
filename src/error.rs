//! Error types for Filewright.

use thiserror::Error;

/// Library-level error type for Filewright operations.
///
/// Tool invocations never surface this type to the planner; they report
/// failures through [`crate::tools::ToolError`] instead.
#[derive(Error, Debug)]
pub enum FilewrightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid tool schema: {0}")]
    InvalidSchema(String),

    #[error("Unknown agent '{name}'; available agents: {available}")]
    UnknownAgent { name: String, available: String },

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Filewright operations.
pub type Result<T> = std::result::Result<T, FilewrightError>;
