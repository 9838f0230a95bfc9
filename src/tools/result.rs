//! Tool outcomes and their flattening into planner-facing text.

use std::fmt;
use std::io;
use thiserror::Error;

/// Outcome of a single tool invocation.
pub type ToolResult = std::result::Result<String, ToolError>;

/// Kind of filesystem entry a check expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => write!(f, "file"),
            PathKind::Directory => write!(f, "directory"),
        }
    }
}

/// Failure categories a tool can report.
///
/// Every variant names the offending path or argument so the planner can
/// correct its next call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("{label} '{path}' does not exist.")]
    NotFound { label: String, path: String },

    #[error("'{path}' is not a {expected}.")]
    WrongType { path: String, expected: PathKind },

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("{label} '{path}' already exists. Use force_overwrite=true to override.")]
    AlreadyExists { label: String, path: String },

    #[error("Permission denied ({0}). Check if you have access rights to the paths involved.")]
    PermissionDenied(String),

    #[error("{program} is required {purpose}. Please install it and ensure it's in your PATH.")]
    DependencyMissing { program: String, purpose: String },

    #[error("Deletion requires confirmation. To delete '{path}', please call this tool again with confirm=true.")]
    Unconfirmed { path: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Generic(String),
}

impl ToolError {
    /// Map an I/O error from a delegate into the taxonomy.
    pub fn io(context: impl fmt::Display, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ToolError::PermissionDenied(context.to_string()),
            _ => ToolError::Generic(format!("{}: {}", context, err)),
        }
    }

    /// Short category name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound { .. } => "not_found",
            ToolError::WrongType { .. } => "wrong_type",
            ToolError::UnsupportedFormat(_) => "unsupported_format",
            ToolError::AlreadyExists { .. } => "already_exists",
            ToolError::PermissionDenied(_) => "permission_denied",
            ToolError::DependencyMissing { .. } => "dependency_missing",
            ToolError::Unconfirmed { .. } => "unconfirmed",
            ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::Generic(_) => "generic",
        }
    }
}

/// Flatten a tool outcome into the single string the planner observes.
pub fn encode(result: &ToolResult) -> String {
    match result {
        Ok(message) => message.clone(),
        Err(e) => format!("Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_success_is_verbatim() {
        let result: ToolResult = Ok("File 'a.txt' successfully deleted.".to_string());
        assert_eq!(encode(&result), "File 'a.txt' successfully deleted.");
    }

    #[test]
    fn test_encode_failure_names_path() {
        let result: ToolResult = Err(ToolError::NotFound {
            label: "Source file".to_string(),
            path: "/tmp/missing.png".to_string(),
        });
        assert_eq!(
            encode(&result),
            "Error: Source file '/tmp/missing.png' does not exist."
        );
    }

    #[test]
    fn test_unconfirmed_carries_instruction() {
        let err = ToolError::Unconfirmed {
            path: "report.pdf".to_string(),
        };
        let text = encode(&Err(err));
        assert!(text.contains("report.pdf"));
        assert!(text.contains("confirm=true"));
    }

    #[test]
    fn test_io_permission_denied_maps_to_category() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let mapped = ToolError::io("copying 'a' to 'b'", &err);
        assert_eq!(mapped.kind(), "permission_denied");

        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let mapped = ToolError::io("copying 'a' to 'b'", &err);
        assert_eq!(mapped, ToolError::Generic("copying 'a' to 'b': disk on fire".to_string()));
    }
}
