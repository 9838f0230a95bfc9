//! Pre-flight path checks shared by all tools.
//!
//! Checks run in the order given and stop at the first violation, so a
//! missing file is always reported as missing rather than as the wrong type.
//! Only output locations are ever created here.

use super::result::{PathKind, ToolError};
use std::path::{Path, PathBuf};

/// A single expectation about a path argument.
#[derive(Debug, Clone, Copy)]
pub enum Expect {
    /// The path must exist.
    Exists,
    /// The path must be a regular file (checked only if it exists).
    File,
    /// The path must be a directory (checked only if it exists).
    Directory,
    /// The path must end in one of these extensions (case-insensitive).
    Extension(&'static [&'static str]),
    /// The path must not exist unless overwriting is allowed; an existing
    /// directory is never an acceptable file destination.
    Vacant { force_overwrite: bool },
}

/// Extensions accepted as PDF input.
pub const PDF: &[&str] = &["pdf"];

/// Check `raw` against `expectations`, returning it as a path on success.
pub fn check(label: &str, raw: &str, expectations: &[Expect]) -> Result<PathBuf, ToolError> {
    if raw.trim().is_empty() {
        return Err(ToolError::InvalidArgument(format!(
            "{} path must not be empty.",
            label
        )));
    }

    let path = PathBuf::from(raw);
    for expectation in expectations {
        match *expectation {
            Expect::Exists => {
                if !path.exists() {
                    return Err(ToolError::NotFound {
                        label: label.to_string(),
                        path: raw.to_string(),
                    });
                }
            }
            Expect::File => {
                if path.exists() && !path.is_file() {
                    return Err(ToolError::WrongType {
                        path: raw.to_string(),
                        expected: PathKind::File,
                    });
                }
            }
            Expect::Directory => {
                if path.exists() && !path.is_dir() {
                    return Err(ToolError::WrongType {
                        path: raw.to_string(),
                        expected: PathKind::Directory,
                    });
                }
            }
            Expect::Extension(allowed) => {
                if !has_extension(&path, allowed) {
                    return Err(ToolError::UnsupportedFormat(format!(
                        "File '{}' is not a {} file.",
                        raw,
                        allowed
                            .iter()
                            .map(|e| e.to_uppercase())
                            .collect::<Vec<_>>()
                            .join("/")
                    )));
                }
            }
            Expect::Vacant { force_overwrite } => {
                if path.is_dir() {
                    return Err(ToolError::WrongType {
                        path: raw.to_string(),
                        expected: PathKind::File,
                    });
                }
                if path.exists() && !force_overwrite {
                    return Err(ToolError::AlreadyExists {
                        label: label.to_string(),
                        path: raw.to_string(),
                    });
                }
            }
        }
    }

    Ok(path)
}

/// An existing regular file.
pub fn input_file(label: &str, raw: &str) -> Result<PathBuf, ToolError> {
    check(label, raw, &[Expect::Exists, Expect::File])
}

/// An existing PDF file.
pub fn input_pdf(label: &str, raw: &str) -> Result<PathBuf, ToolError> {
    check(label, raw, &[Expect::Exists, Expect::File, Expect::Extension(PDF)])
}

/// Whether `path` has one of the `allowed` extensions.
pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Create the parent directory of an output path if it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ToolError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Create an output directory (recursively, idempotently).
pub fn ensure_dir(dir: &Path) -> Result<(), ToolError> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(ToolError::WrongType {
            path: dir.display().to_string(),
            expected: PathKind::Directory,
        });
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| ToolError::io(format!("creating directory '{}'", dir.display()), &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_is_reported_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let raw = missing.to_str().unwrap();

        let err = input_pdf("PDF file", raw).unwrap_err();
        assert_eq!(
            err,
            ToolError::NotFound {
                label: "PDF file".to_string(),
                path: raw.to_string()
            }
        );
    }

    #[test]
    fn test_directory_is_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().to_str().unwrap();

        let err = input_file("Source file", raw).unwrap_err();
        assert!(matches!(err, ToolError::WrongType { expected: PathKind::File, .. }));
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let upper = dir.path().join("REPORT.PDF");
        std::fs::write(&upper, b"%PDF-1.5").unwrap();
        assert!(input_pdf("PDF file", upper.to_str().unwrap()).is_ok());

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"hi").unwrap();
        let err = input_pdf("PDF file", text.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("is not a PDF file"));
    }

    #[test]
    fn test_vacant_respects_force_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("taken.txt");
        std::fs::write(&existing, b"x").unwrap();
        let raw = existing.to_str().unwrap();

        let err = check("Destination path", raw, &[Expect::Vacant { force_overwrite: false }])
            .unwrap_err();
        assert!(matches!(err, ToolError::AlreadyExists { .. }));
        assert!(check("Destination path", raw, &[Expect::Vacant { force_overwrite: true }]).is_ok());

        let err = check(
            "Destination path",
            dir.path().to_str().unwrap(),
            &[Expect::Vacant { force_overwrite: true }],
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::WrongType { .. }));
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let err = input_file("Source file", "  ").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_ensure_parent_dir_is_recursive_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a").join("b").join("out.png");
        ensure_parent_dir(&out).unwrap();
        ensure_parent_dir(&out).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());

        ensure_parent_dir(Path::new("relative.png")).unwrap();
    }
}
