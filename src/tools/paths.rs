//! Output path and format derivation for conversion tools.

use super::result::ToolError;
use super::validate::ensure_parent_dir;
use std::path::{Path, PathBuf};

/// A concrete output location and the format token it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub path: PathBuf,
    /// Lowercase format token without a leading dot (e.g. `png`).
    pub format: String,
}

/// Derive the output path and format from partial input.
///
/// - An explicit output path with an extension fixes the format, whatever
///   `format` says.
/// - An explicit output path without an extension gets `.<format>` appended.
/// - Without an output path, the input's extension is replaced by `format`.
///
/// The output directory is created before returning.
pub fn resolve_output(
    input: &Path,
    output_path: Option<&str>,
    format: Option<&str>,
) -> Result<ResolvedOutput, ToolError> {
    let format = format
        .map(|f| f.trim().trim_start_matches('.').to_lowercase())
        .filter(|f| !f.is_empty());
    let output_path = output_path.map(str::trim).filter(|p| !p.is_empty());

    let resolved = match (output_path, format) {
        (Some(out), format) => {
            let path = PathBuf::from(out);
            match (extension_of(&path), format) {
                (Some(ext), _) => ResolvedOutput { path, format: ext },
                (None, Some(format)) => ResolvedOutput {
                    path: PathBuf::from(format!("{}.{}", out, format)),
                    format,
                },
                (None, None) => {
                    return Err(ToolError::UnsupportedFormat(format!(
                        "Cannot determine the output format of '{}'. Add an extension or provide output_format.",
                        out
                    )))
                }
            }
        }
        (None, Some(format)) => ResolvedOutput {
            path: input.with_extension(&format),
            format,
        },
        (None, None) => {
            return Err(ToolError::InvalidArgument(
                "Either output_path or output_format must be provided.".to_string(),
            ))
        }
    };

    ensure_parent_dir(&resolved.path)?;
    Ok(resolved)
}

/// Lowercase extension of a path, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}
