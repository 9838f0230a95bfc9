//! Declarative agent descriptions.

use crate::error::{FilewrightError, Result};
use crate::tools::{ToolDescriptor, ToolSet};
use std::collections::HashSet;
use std::fmt;

/// The model an agent is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub name: String,
    pub max_tokens: u32,
}

impl ModelRef {
    pub fn new(name: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            name: name.into(),
            max_tokens,
        }
    }
}

/// Step limits for one agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentLimits {
    /// Maximum number of model calls that may request tools.
    pub max_steps: usize,
    /// Ask the model for an updated plan every this many steps.
    pub planning_interval: Option<usize>,
}

/// How an agent gets work done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Calls its own tools.
    ToolCalling,
    /// Only delegates to managed sub-agents.
    Orchestrator,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::ToolCalling => write!(f, "tool-calling"),
            AgentKind::Orchestrator => write!(f, "orchestrator"),
        }
    }
}

/// Everything needed to run an agent: model, tools, sub-agents and limits.
///
/// Built once per process and never persisted.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    pub kind: AgentKind,
    pub model: ModelRef,
    pub tools: ToolSet,
    pub managed: Vec<AgentDescriptor>,
    pub limits: AgentLimits,
}

impl AgentDescriptor {
    /// A tool-calling agent with no sub-agents.
    pub fn tool_calling(
        name: &str,
        description: &str,
        model: ModelRef,
        tools: ToolSet,
        limits: AgentLimits,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: AgentKind::ToolCalling,
            model,
            tools,
            managed: Vec::new(),
            limits,
        }
    }

    /// An agent that acts only through `managed` sub-agents.
    pub fn orchestrator(
        name: &str,
        description: &str,
        model: ModelRef,
        managed: Vec<AgentDescriptor>,
        limits: AgentLimits,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: AgentKind::Orchestrator,
            model,
            tools: ToolSet::new(),
            managed,
            limits,
        }
    }

    /// Apply step-limit and model overrides.
    pub fn with_overrides(
        mut self,
        model: Option<&str>,
        max_tokens: Option<u32>,
        max_steps: Option<usize>,
        planning_interval: Option<usize>,
    ) -> Self {
        if let Some(model) = model {
            self.model.name = model.to_string();
        }
        if let Some(max_tokens) = max_tokens {
            self.model.max_tokens = max_tokens;
        }
        if let Some(max_steps) = max_steps {
            self.limits.max_steps = max_steps;
        }
        if let Some(interval) = planning_interval {
            self.limits.planning_interval = (interval > 0).then_some(interval);
        }
        self
    }

    /// Check limits and name uniqueness, recursively.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| FilewrightError::Agent(format!("agent '{}': {}", self.name, msg));

        if self.name.trim().is_empty() {
            return Err(FilewrightError::Agent("agent name must not be empty".to_string()));
        }
        if self.limits.max_steps == 0 {
            return Err(invalid("max_steps must be at least 1".to_string()));
        }
        if self.limits.planning_interval == Some(0) {
            return Err(invalid("planning_interval must be at least 1".to_string()));
        }
        if self.kind == AgentKind::Orchestrator && !self.tools.is_empty() {
            return Err(invalid("an orchestrator has no tools of its own".to_string()));
        }

        let mut names: HashSet<String> = self.tools.names().into_iter().collect();
        for sub in &self.managed {
            if !names.insert(sub.name.clone()) {
                return Err(invalid(format!("'{}' is registered twice", sub.name)));
            }
            sub.validate()?;
        }
        Ok(())
    }

    /// Descriptors of every callable the agent exposes to its model.
    ///
    /// Managed sub-agents appear as tools taking a `task`.
    pub fn callables(&self) -> Vec<ToolDescriptor> {
        let mut all = self.tools.descriptors();
        all.extend(self.managed.iter().map(super::managed::describe));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_steps: usize, planning_interval: Option<usize>) -> AgentLimits {
        AgentLimits {
            max_steps,
            planning_interval,
        }
    }

    fn worker(name: &str) -> AgentDescriptor {
        AgentDescriptor::tool_calling(
            name,
            "Does work.",
            ModelRef::new("gpt-4o-mini", 2048),
            ToolSet::new(),
            limits(20, None),
        )
    }

    #[test]
    fn test_overrides() {
        let agent = worker("FileOrganizer").with_overrides(Some("gpt-4.1"), None, Some(3), Some(0));
        assert_eq!(agent.model, ModelRef::new("gpt-4.1", 2048));
        assert_eq!(agent.limits, limits(3, None));
    }

    #[test]
    fn test_validate_rejects_duplicate_sub_agents() {
        let boss = AgentDescriptor::orchestrator(
            "Boss",
            "Delegates.",
            ModelRef::new("gpt-4o", 8096),
            vec![worker("A"), worker("A")],
            limits(15, Some(5)),
        );
        let err = boss.validate().unwrap_err();
        assert!(err.to_string().contains("'A' is registered twice"));
    }

    #[test]
    fn test_validate_rejects_zero_steps() {
        let agent = worker("Lazy").with_overrides(None, None, Some(0), None);
        assert!(agent.validate().is_err());
    }

    #[test]
    fn test_sub_agents_are_callables() {
        let boss = AgentDescriptor::orchestrator(
            "Boss",
            "Delegates.",
            ModelRef::new("gpt-4o", 8096),
            vec![worker("PdfEditor")],
            limits(15, Some(5)),
        );
        let callables = boss.callables();
        assert_eq!(callables.len(), 1);
        assert_eq!(callables[0].name, "PdfEditor");
        assert!(callables[0].inputs.get("task").is_some());
    }
}
