//! Filewright CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use filewright::cli::{commands, Cli, Commands};
use filewright::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // RUST_LOG wins, then -v, then the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("filewright={}", log_level))),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    if let Some(dir) = settings.working_dir() {
        std::env::set_current_dir(&dir)
            .with_context(|| format!("Cannot use working directory {}", dir.display()))?;
    }

    match &cli.command {
        Commands::Run {
            agent,
            request,
            model,
            max_steps,
        } => {
            commands::run_agent(
                agent,
                &request.join(" "),
                model.clone(),
                *max_steps,
                cli.verbose > 0,
                &settings,
            )
            .await?;
        }

        Commands::Agents => {
            commands::run_agents(&settings)?;
        }

        Commands::Tools { agent } => {
            commands::run_tools(agent, &settings)?;
        }

        Commands::Call { agent, tool, args } => {
            if !commands::run_call(agent, tool, args, &settings).await? {
                std::process::exit(1);
            }
        }

        Commands::Doctor => {
            if !commands::run_doctor(&config_path, &settings)? {
                std::process::exit(1);
            }
        }

        Commands::Config { action } => {
            commands::run_config(action, &config_path, &settings)?;
        }
    }

    Ok(())
}
