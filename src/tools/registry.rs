//! A named set of tools bound to one agent.

use super::result::{ToolError, ToolResult};
use super::schema::ToolDescriptor;
use super::Tool;
use crate::error::{FilewrightError, Result};
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Tools an agent may call, keyed by unique name.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<(ToolDescriptor, Arc<dyn Tool>)>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool after checking its descriptor.
    ///
    /// Fails when the descriptor is malformed, the name is already taken,
    /// or the declared parameters do not decode into the tool's arguments.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let descriptor = tool.descriptor();
        descriptor.validate().map_err(FilewrightError::InvalidSchema)?;

        if self.get(&descriptor.name).is_some() {
            return Err(FilewrightError::InvalidSchema(format!(
                "tool name '{}' is registered twice",
                descriptor.name
            )));
        }

        for sample in [descriptor.inputs.sample_full(), descriptor.inputs.sample_required()] {
            tool.check_args(&sample).map_err(|e| {
                FilewrightError::InvalidSchema(format!(
                    "tool '{}' does not accept its declared parameters: {}",
                    descriptor.name, e
                ))
            })?;
        }

        self.tools.push((descriptor, tool));
        Ok(())
    }

    /// Builder-style [`ToolSet::register`].
    pub fn with(mut self, tool: impl Tool + 'static) -> Result<Self> {
        self.register(Arc::new(tool))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, tool)| tool)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|(d, _)| d.clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|(d, _)| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name.
    ///
    /// Unknown names and panics inside the tool come back as failures.
    #[instrument(skip(self, args), fields(tool = %name))]
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return Err(ToolError::InvalidArgument(format!(
                "Unknown tool '{}'. Available tools: {}.",
                name,
                self.names().join(", ")
            )));
        };

        info!("Calling tool");

        let result = match AssertUnwindSafe(tool.forward(args)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Generic(format!(
                "Unexpected error: tool '{}' panicked.",
                name
            ))),
        };

        if let Err(e) = &result {
            warn!(kind = e.kind(), "Tool failed: {}", e);
        }
        result
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
