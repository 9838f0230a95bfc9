//! Pre-flight checks before talking to the model.
//!
//! Validates that credentials are available before starting a run that
//! would otherwise fail on its first request.

use crate::error::{FilewrightError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Running an agent requires the API key.
    Run,
    /// Calling a tool that talks to the API (image generation).
    RemoteTool,
    /// Calling a local tool has no requirements up front; missing programs
    /// are reported by the tool itself.
    LocalTool,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Run | Operation::RemoteTool => check_api_key(),
        Operation::LocalTool => Ok(()),
    }
}

/// Check if the OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(FilewrightError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(FilewrightError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Version flag understood by an external program.
pub fn version_arg(program: &str) -> &'static str {
    let stem = std::path::Path::new(program)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(program);
    match stem {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Check if an external program is available, returning its version line.
pub fn check_program(program: &str) -> Result<String> {
    match Command::new(program).arg(version_arg(program)).output() {
        Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("installed")
            .trim()
            .to_string()),
        Ok(_) => Err(FilewrightError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            program
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FilewrightError::ToolNotFound(program.to_string()))
        }
        Err(e) => Err(FilewrightError::ToolNotFound(format!("{}: {}", program, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_tools_have_no_requirements() {
        assert!(check(Operation::LocalTool).is_ok());
    }

    #[test]
    fn test_version_arg() {
        assert_eq!(version_arg("ffmpeg"), "-version");
        assert_eq!(version_arg("/usr/local/bin/ffmpeg"), "-version");
        assert_eq!(version_arg("qpdf"), "--version");
    }

    #[test]
    fn test_missing_program() {
        let err = check_program("filewright-no-such-program").unwrap_err();
        assert!(matches!(err, FilewrightError::ToolNotFound(name) if name == "filewright-no-such-program"));
    }
}
