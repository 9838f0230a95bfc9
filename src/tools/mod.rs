//! Tools the agents can call.
//!
//! Every tool follows the same shape: validate path arguments, derive
//! defaults, delegate the real work to one library or program, and report
//! the outcome as a [`ToolResult`]. Nothing raised by a delegate crosses
//! the tool boundary; [`ToolSet::dispatch`] turns panics into failures too.

pub mod convert;
mod external;
pub mod filesystem;
pub mod image_gen;
pub mod paths;
pub mod pdf;
mod registry;
mod result;
mod schema;
mod staging;
pub mod validate;

pub use external::ExternalProgram;
pub use registry::ToolSet;
pub use result::{encode, PathKind, ToolError, ToolResult};
pub use schema::{ParamSpec, ParamType, ToolDescriptor, ToolSchema};
pub use staging::StagedFile;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Object-safe tool interface used by agents and the dispatcher.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description, input schema and output type.
    fn descriptor(&self) -> ToolDescriptor;

    /// Check that `args` decode into this tool's parameters.
    fn check_args(&self, args: &Value) -> Result<(), ToolError>;

    /// Execute the tool.
    async fn forward(&self, args: Value) -> ToolResult;
}

/// A tool with statically typed arguments.
///
/// Implement this rather than [`Tool`]; the blanket implementation decodes
/// the planner's JSON into `Args`, rejecting unknown or missing parameters.
#[async_trait]
pub trait TypedTool: Send + Sync {
    type Args: DeserializeOwned + Send + 'static;

    fn descriptor(&self) -> ToolDescriptor;

    async fn run(&self, args: Self::Args) -> ToolResult;
}

#[async_trait]
impl<T: TypedTool> Tool for T {
    fn descriptor(&self) -> ToolDescriptor {
        TypedTool::descriptor(self)
    }

    fn check_args(&self, args: &Value) -> Result<(), ToolError> {
        parse_args::<T::Args>(args.clone()).map(|_| ())
    }

    async fn forward(&self, args: Value) -> ToolResult {
        let args = parse_args::<T::Args>(args)?;
        self.run(args).await
    }
}

/// Decode tool arguments, treating `null` as "no arguments".
pub fn parse_args<A: DeserializeOwned>(args: Value) -> Result<A, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid arguments: {}", e)))
}

/// Run blocking library work off the async runtime.
pub(crate) async fn blocking<F, T>(what: &'static str, work: F) -> Result<T, ToolError>
where
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(ToolError::Generic(format!("Error {}: the library panicked", what))),
        Err(e) => Err(ToolError::Generic(format!("Error {}: {}", what, e))),
    }
}
