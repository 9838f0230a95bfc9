//! Filewright - file agents driven by a language model
//!
//! A model plans; a fixed set of tools does the work. Every tool validates its
//! path arguments, derives defaults, delegates to one library or external
//! program and reports a single string back to the model.
//!
//! # Architecture
//!
//! - `tools` - the tool contract, validation, path resolution and the tools
//! - `agent` - agent descriptors, the tool calling loop and the agent registry
//! - `config` - settings and prompt templates
//! - `openai` - OpenAI client construction
//! - `cli` - command line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use filewright::agent::{Agent, AgentRegistry, OpenAiProvider};
//! use filewright::config::{AgentPrompts, Settings};
//! use filewright::openai::create_client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let descriptor = AgentRegistry::builtin().descriptor("PdfEditor", &settings)?;
//!     let provider = OpenAiProvider::new(create_client(&settings.openai)?);
//!     let agent = Agent::build(&descriptor, &provider, &AgentPrompts::default())?;
//!
//!     let response = agent.run("Merge a.pdf and b.pdf into ab.pdf").await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod tools;

pub use error::{FilewrightError, Result};
