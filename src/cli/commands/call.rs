//! Call command implementation.

use crate::agent::catalog::IMAGE_CREATOR;
use crate::agent::AgentRegistry;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::encode;
use anyhow::{Context, Result};
use serde_json::Value;

/// Invoke one of an agent's tools directly and print the encoded result.
///
/// Returns `false` when the tool reported a failure.
pub async fn run_call(agent: &str, tool: &str, args: &str, settings: &Settings) -> Result<bool> {
    let descriptor = AgentRegistry::builtin().descriptor(agent, settings)?;

    let operation = if descriptor.name == IMAGE_CREATOR {
        Operation::RemoteTool
    } else {
        Operation::LocalTool
    };
    preflight::check(operation)?;

    let args: Value = serde_json::from_str(args).context("Tool arguments must be a JSON object")?;

    let result = descriptor.tools.dispatch(tool, args).await;
    let text = encode(&result);
    match &result {
        Ok(_) => println!("{}", text),
        Err(_) => Output::error(&text),
    }
    Ok(result.is_ok())
}
