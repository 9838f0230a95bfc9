//! All-or-nothing output files.
//!
//! Single-file tools write into a hidden temporary file next to the target
//! and rename it into place only once the delegate has succeeded. Dropping
//! an uncommitted [`StagedFile`] removes the temporary file.

use super::paths::extension_of;
use super::result::ToolError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A temporary file that becomes `target` on [`StagedFile::commit`].
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Stage a new file for `target`. The target's directory must exist.
    ///
    /// The temporary file keeps the target's extension so that programs
    /// which infer the format from the name (ffmpeg) behave the same.
    pub fn new(target: &Path) -> Result<Self, ToolError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let suffix = extension_of(target)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(".filewright-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| {
                ToolError::io(format!("creating a temporary file in '{}'", dir.display()), &e)
            })?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Path of the temporary file, for delegates that write by path.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Open handle on the temporary file.
    pub fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    /// Move the temporary file onto the target, replacing it.
    pub fn commit(self) -> Result<PathBuf, ToolError> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| ToolError::io(format!("writing '{}'", target.display()), &e.error))?;
        Ok(target)
    }
}
