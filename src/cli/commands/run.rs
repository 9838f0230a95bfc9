//! Run command implementation.

use crate::agent::{Agent, AgentRegistry, OpenAiProvider};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{AgentPrompts, Settings};
use crate::openai::create_client;
use anyhow::Result;

/// Run an agent on a request and print its final answer.
pub async fn run_agent(
    agent: &str,
    request: &str,
    model: Option<String>,
    max_steps: Option<usize>,
    verbose: bool,
    settings: &Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run) {
        Output::error(&format!("{}", e));
        Output::info("Run 'filewright doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let descriptor = AgentRegistry::builtin()
        .descriptor(agent, settings)?
        .with_overrides(model.as_deref(), None, max_steps, None);

    let provider = OpenAiProvider::new(create_client(&settings.openai)?);
    let prompts = AgentPrompts::from_settings(&settings.prompts);
    let agent = Agent::build(&descriptor, &provider, &prompts)?;

    let spinner = Output::spinner(&format!("{} working...", agent.name()));
    let outcome = agent.run(request).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(response) => {
            println!("\n{}\n", response.content);

            if verbose && !response.tool_calls.is_empty() {
                Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
                for call in &response.tool_calls {
                    Output::tool_call(&call.name, &call.arguments, &call.result);
                }
                println!();
            }

            Output::info(&format!(
                "Completed in {} step(s), {} plan(s)",
                response.steps, response.plans
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Agent failed: {}", e));
            Err(e.into())
        }
    }
}
