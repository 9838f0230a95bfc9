//! Tools command implementation.

use crate::agent::AgentRegistry;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use serde_json::json;

/// Print the tool schemas an agent offers its model, as JSON.
pub fn run_tools(agent: &str, settings: &Settings) -> Result<()> {
    let descriptor = AgentRegistry::builtin().descriptor(agent, settings)?;

    let tools: Vec<_> = descriptor
        .callables()
        .into_iter()
        .map(|d| {
            json!({
                "name": d.name,
                "description": d.description,
                "parameters": d.inputs.to_json_schema(),
                "output_type": d.output_type.as_str(),
            })
        })
        .collect();

    if tools.is_empty() {
        Output::warning(&format!("{} exposes no tools", descriptor.name));
    }
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}
