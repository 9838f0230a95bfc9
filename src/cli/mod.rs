//! CLI module for Filewright.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Filewright - file agents driven by a language model
///
/// Converts, organizes and edits files by letting a model pick from a fixed
/// set of validated tools.
#[derive(Parser, Debug)]
#[command(name = "filewright")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FILEWRIGHT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an agent on a natural-language request
    Run {
        /// Agent name (see `filewright agents`)
        agent: String,

        /// The request, e.g. "convert report.docx to markdown"
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,

        /// Override the agent's model
        #[arg(short, long)]
        model: Option<String>,

        /// Override the agent's step limit
        #[arg(long)]
        max_steps: Option<usize>,
    },

    /// List registered agents
    Agents,

    /// Print the tool schemas an agent offers its model
    Tools {
        /// Agent name
        agent: String,
    },

    /// Invoke one tool directly, without a model
    Call {
        /// Agent that owns the tool
        agent: String,

        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Check external programs and credentials
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_joins_request_words() {
        let cli = Cli::try_parse_from([
            "filewright",
            "-vv",
            "run",
            "PdfEditor",
            "merge",
            "a.pdf",
            "and",
            "b.pdf",
            "--max-steps",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                agent,
                request,
                max_steps,
                model,
            } => {
                assert_eq!(agent, "PdfEditor");
                assert_eq!(request.join(" "), "merge a.pdf and b.pdf");
                assert_eq!(max_steps, Some(4));
                assert!(model.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_call_defaults_to_empty_args() {
        let cli = Cli::try_parse_from(["filewright", "call", "FileOrganizer", "delete_file_tool"]).unwrap();
        assert!(matches!(cli.command, Commands::Call { ref args, .. } if args == "{}"));
    }

    #[test]
    fn test_run_requires_request() {
        assert!(Cli::try_parse_from(["filewright", "run", "PdfEditor"]).is_err());
    }
}
