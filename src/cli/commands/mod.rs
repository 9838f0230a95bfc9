//! CLI command implementations.

mod agents;
mod call;
mod config;
mod doctor;
mod run;
mod tools;

pub use agents::run_agents;
pub use call::run_call;
pub use config::run_config;
pub use doctor::run_doctor;
pub use run::run_agent;
pub use tools::run_tools;
