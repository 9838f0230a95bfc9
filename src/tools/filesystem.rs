//! File organization tools: rename/move, copy and delete.

use super::result::{ToolError, ToolResult};
use super::schema::{ParamType, ToolDescriptor, ToolSchema};
use super::staging::StagedFile;
use super::validate::{self, Expect};
use super::TypedTool;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Arguments of [`DeleteFileTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteFileArgs {
    pub file_path: String,
    #[serde(default)]
    pub confirm: Option<bool>,
}

/// Permanently removes a file, but only when explicitly confirmed.
#[derive(Debug, Default)]
pub struct DeleteFileTool;

#[async_trait]
impl TypedTool for DeleteFileTool {
    type Args = DeleteFileArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "delete_file_tool",
            "A tool for deleting files from the file system. \
             This tool can permanently remove a file from the specified path. \
             By default, the tool requires confirmation to prevent accidental deletions.",
            ToolSchema::new()
                .required(
                    "file_path",
                    ParamType::String,
                    "The full path to the file that needs to be deleted.",
                )
                .optional(
                    "confirm",
                    ParamType::Boolean,
                    "Confirmation flag that must be explicitly set to true to delete the file. \
                     This helps prevent accidental deletions.",
                ),
        )
    }

    async fn run(&self, args: DeleteFileArgs) -> ToolResult {
        let path = validate::input_file("File", &args.file_path)?;

        if !args.confirm.unwrap_or(false) {
            return Err(ToolError::Unconfirmed {
                path: args.file_path,
            });
        }

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ToolError::io(format!("Error deleting file '{}'", args.file_path), &e))?;

        info!("Deleted {}", args.file_path);
        Ok(format!("File '{}' successfully deleted.", args.file_path))
    }
}

/// Arguments of [`CopyFileTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyFileArgs {
    pub source_path: String,
    pub destination_path: String,
    #[serde(default)]
    pub force_overwrite: Option<bool>,
}

/// Duplicates a file, refusing to clobber an existing destination.
#[derive(Debug, Default)]
pub struct CopyFileTool;

#[async_trait]
impl TypedTool for CopyFileTool {
    type Args = CopyFileArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "copy_file_tool",
            "A tool for copying files from one location to another in the file system. \
             This tool can duplicate a file while leaving the original intact. \
             The tool will check if the source file exists and if the destination already exists \
             to prevent accidental overwrites.",
            ToolSchema::new()
                .required(
                    "source_path",
                    ParamType::String,
                    "The full path to the file you want to copy.",
                )
                .required(
                    "destination_path",
                    ParamType::String,
                    "The full path where the file should be copied to, including the filename.",
                )
                .optional(
                    "force_overwrite",
                    ParamType::Boolean,
                    "If true, will overwrite the destination file if it exists. Default is false.",
                ),
        )
    }

    async fn run(&self, args: CopyFileArgs) -> ToolResult {
        let source = validate::input_file("Source file", &args.source_path)?;
        let destination = validate::check(
            "Destination path",
            &args.destination_path,
            &[Expect::Vacant {
                force_overwrite: args.force_overwrite.unwrap_or(false),
            }],
        )?;
        validate::ensure_parent_dir(&destination)?;

        copy_staged(&source, &destination)
            .await
            .map_err(|e| with_context(e, "Error copying file"))?;

        info!("Copied {} -> {}", args.source_path, args.destination_path);
        Ok(format!(
            "File successfully copied from '{}' to '{}'.",
            args.source_path, args.destination_path
        ))
    }
}

/// Arguments of [`RenameFileTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameFileArgs {
    pub source_path: String,
    pub target_path: String,
    #[serde(default)]
    pub force_overwrite: Option<bool>,
}

/// Renames a file or moves it to another directory.
#[derive(Debug, Default)]
pub struct RenameFileTool;

#[async_trait]
impl TypedTool for RenameFileTool {
    type Args = RenameFileArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "rename_file_tool",
            "A tool for renaming or moving files in the file system. \
             This tool can move a file from one location to another, or simply rename it within the same directory. \
             The tool will check if the source file exists and if the destination doesn't already exist \
             to prevent accidental overwrites.",
            ToolSchema::new()
                .required(
                    "source_path",
                    ParamType::String,
                    "The full path to the file you want to rename or move.",
                )
                .required(
                    "target_path",
                    ParamType::String,
                    "The full path to the new location and/or filename.",
                )
                .optional(
                    "force_overwrite",
                    ParamType::Boolean,
                    "If true, will overwrite the destination file if it exists. Default is false.",
                ),
        )
    }

    async fn run(&self, args: RenameFileArgs) -> ToolResult {
        let source = validate::input_file("Source file", &args.source_path)?;
        let target = validate::check(
            "Target path",
            &args.target_path,
            &[Expect::Vacant {
                force_overwrite: args.force_overwrite.unwrap_or(false),
            }],
        )?;
        validate::ensure_parent_dir(&target)?;

        match tokio::fs::rename(&source, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(ToolError::io("Error renaming/moving file", &e));
            }
            Err(e) => {
                // Different filesystems cannot rename; copy then remove.
                debug!("rename failed ({}), falling back to copy", e);
                copy_staged(&source, &target)
                    .await
                    .map_err(|e| with_context(e, "Error renaming/moving file"))?;
                tokio::fs::remove_file(&source)
                    .await
                    .map_err(|e| ToolError::io("Error removing the original after moving it", &e))?;
            }
        }

        info!("Moved {} -> {}", args.source_path, args.target_path);
        Ok(format!(
            "File successfully moved/renamed from '{}' to '{}'.",
            args.source_path, args.target_path
        ))
    }
}

/// Copy `source` to `destination` through a staged temporary file.
async fn copy_staged(source: &Path, destination: &Path) -> Result<(), ToolError> {
    let staged = StagedFile::new(destination)?;
    tokio::fs::copy(source, staged.path())
        .await
        .map_err(|e| ToolError::io(format!("'{}'", source.display()), &e))?;
    staged.commit()?;
    Ok(())
}

fn with_context(err: ToolError, context: &str) -> ToolError {
    match err {
        ToolError::Generic(msg) => ToolError::Generic(format!("{}: {}", context, msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::encode;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, b"hello").unwrap();
        let file = file.to_str().unwrap().to_string();
        (dir, file)
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (_dir, file) = scratch();

        let result = DeleteFileTool
            .run(DeleteFileArgs {
                file_path: file.clone(),
                confirm: None,
            })
            .await;
        assert!(matches!(result, Err(ToolError::Unconfirmed { .. })));
        assert!(encode(&result).contains("confirm=true"));
        assert!(Path::new(&file).exists());

        let result = DeleteFileTool
            .run(DeleteFileArgs {
                file_path: file.clone(),
                confirm: Some(true),
            })
            .await;
        assert_eq!(result.unwrap(), format!("File '{}' successfully deleted.", file));
        assert!(!Path::new(&file).exists());
    }

    #[tokio::test]
    async fn test_delete_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt").to_str().unwrap().to_string();

        let err = DeleteFileTool
            .run(DeleteFileArgs {
                file_path: missing.clone(),
                confirm: Some(true),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&missing));

        let err = DeleteFileTool
            .run(DeleteFileArgs {
                file_path: dir.path().to_str().unwrap().to_string(),
                confirm: Some(true),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::WrongType { .. }));
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn test_copy_guards_existing_destination() {
        let (dir, file) = scratch();
        let dest = dir.path().join("copy.txt");
        std::fs::write(&dest, b"keep me").unwrap();
        let dest_str = dest.to_str().unwrap().to_string();

        let err = CopyFileTool
            .run(CopyFileArgs {
                source_path: file.clone(),
                destination_path: dest_str.clone(),
                force_overwrite: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AlreadyExists { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"keep me");

        CopyFileTool
            .run(CopyFileArgs {
                source_path: file.clone(),
                destination_path: dest_str,
                force_overwrite: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
        assert!(Path::new(&file).exists());
    }

    #[tokio::test]
    async fn test_copy_creates_destination_directories() {
        let (dir, file) = scratch();
        let dest = dir.path().join("a").join("b").join("hello.txt");

        let message = CopyFileTool
            .run(CopyFileArgs {
                source_path: file,
                destination_path: dest.to_str().unwrap().to_string(),
                force_overwrite: None,
            })
            .await
            .unwrap();
        assert!(message.contains("successfully copied"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_rename_moves_file() {
        let (dir, file) = scratch();
        let target = dir.path().join("moved").join("olleh.txt");

        RenameFileTool
            .run(RenameFileArgs {
                source_path: file.clone(),
                target_path: target.to_str().unwrap().to_string(),
                force_overwrite: None,
            })
            .await
            .unwrap();

        assert!(!Path::new(&file).exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_rename_refuses_existing_target() {
        let (dir, file) = scratch();
        let target = dir.path().join("other.txt");
        std::fs::write(&target, b"other").unwrap();

        let err = RenameFileTool
            .run(RenameFileArgs {
                source_path: file.clone(),
                target_path: target.to_str().unwrap().to_string(),
                force_overwrite: Some(false),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(Path::new(&file).exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"other");
    }
}
