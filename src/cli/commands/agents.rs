//! Agents command implementation.

use crate::agent::AgentRegistry;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// List the registered agents with their tools or sub-agents.
pub fn run_agents(settings: &Settings) -> Result<()> {
    let registry = AgentRegistry::builtin();

    Output::header("Agents");
    for entry in registry.entries() {
        let descriptor = registry.descriptor(entry.name, settings)?;
        Output::agent_info(entry.name, &descriptor.kind.to_string(), entry.summary);
        Output::kv("model", &format!("{} ({} tokens)", descriptor.model.name, descriptor.model.max_tokens));
        let callables: Vec<String> = descriptor.callables().into_iter().map(|d| d.name).collect();
        Output::kv("calls", &callables.join(", "));
    }
    println!();

    Ok(())
}
