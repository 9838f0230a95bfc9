//! Configuration settings for Filewright.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAiSettings,
    pub models: ModelSettings,
    pub agents: HashMap<String, AgentOverride>,
    pub programs: ProgramSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error), used when neither
    /// `RUST_LOG` nor `-v` is given.
    pub log_level: String,
    /// Working directory for relative paths. Empty means the process cwd.
    pub working_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            working_dir: String::new(),
        }
    }
}

/// OpenAI client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Alternative API base URL (OpenAI-compatible servers).
    pub base_url: Option<String>,
    /// Model used by the image generation tool.
    pub image_model: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
            base_url: None,
            image_model: "dall-e-3".to_string(),
        }
    }
}

/// A model reference as configured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub max_tokens: u32,
}

/// Models bound to agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model for the specialized worker agents.
    pub worker: ModelConfig,
    /// Model for the orchestrator.
    pub orchestrator: ModelConfig,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            worker: ModelConfig {
                name: "gpt-4o-mini".to_string(),
                max_tokens: 2048,
            },
            orchestrator: ModelConfig {
                name: "gpt-4o".to_string(),
                max_tokens: 8096,
            },
        }
    }
}

/// Per-agent overrides, keyed by agent name in `[agents.<Name>]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentOverride {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub max_steps: Option<usize>,
    pub planning_interval: Option<usize>,
}

/// External programs the tools delegate to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSettings {
    pub ffmpeg: String,
    pub docling: String,
    pub qpdf: String,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            docling: "docling".to_string(),
            qpdf: "qpdf".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Replacement system prompt template.
    pub system: Option<String>,
    /// Replacement planning prompt template.
    pub planning: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FilewrightError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("filewright")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Expanded working directory, if one is configured.
    pub fn working_dir(&self) -> Option<PathBuf> {
        if self.general.working_dir.trim().is_empty() {
            None
        } else {
            Some(Self::expand_path(&self.general.working_dir))
        }
    }

    /// Overrides configured for an agent.
    pub fn agent_override(&self, agent: &str) -> AgentOverride {
        self.agents.get(agent).cloned().unwrap_or_default()
    }
}
