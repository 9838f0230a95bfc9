//! External program invocation.
//!
//! Media transcoding, document conversion and PDF encryption are delegated
//! to command-line programs. A program that cannot be spawned is reported
//! as a missing dependency.

use super::result::ToolError;
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// A command-line program a tool depends on.
#[derive(Debug, Clone)]
pub struct ExternalProgram {
    program: String,
    purpose: &'static str,
    success_codes: &'static [i32],
}

impl ExternalProgram {
    /// `purpose` completes the sentence "<program> is required ...".
    pub fn new(program: impl Into<String>, purpose: &'static str) -> Self {
        Self {
            program: program.into(),
            purpose,
            success_codes: &[0],
        }
    }

    /// Treat these exit codes as success (e.g. qpdf exits 3 on warnings).
    pub fn with_success_codes(mut self, codes: &'static [i32]) -> Self {
        self.success_codes = codes;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the program to completion, capturing its output.
    pub async fn run<I, S>(&self, args: I) -> Result<Output, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {:?}", command.as_std());

        let output = match command.output().await {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::DependencyMissing {
                    program: self.program.clone(),
                    purpose: self.purpose.to_string(),
                });
            }
            Err(e) => {
                return Err(ToolError::io(format!("running {}", self.program), &e));
            }
        };

        let code = output.status.code();
        if code.is_some_and(|c| self.success_codes.contains(&c)) {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => format!("exit status {}", output.status),
                text => text.to_string(),
            };
            Err(ToolError::Generic(format!("{} failed: {}", self.program, detail)))
        }
    }
}
