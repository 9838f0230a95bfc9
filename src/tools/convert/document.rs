//! Document extraction through the docling command-line converter.

use crate::tools::external::ExternalProgram;
use crate::tools::result::{ToolError, ToolResult};
use crate::tools::schema::{ParamType, ToolDescriptor, ToolSchema};
use crate::tools::validate;
use crate::tools::TypedTool;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Output representations the document tool can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Markdown,
    Html,
    Dict,
    Text,
    DocumentTokens,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 5] = [
        DocumentFormat::Dict,
        DocumentFormat::DocumentTokens,
        DocumentFormat::Html,
        DocumentFormat::Markdown,
        DocumentFormat::Text,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == wanted)
    }

    /// Name the planner uses.
    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Markdown => "markdown",
            DocumentFormat::Html => "html",
            DocumentFormat::Dict => "dict",
            DocumentFormat::Text => "text",
            DocumentFormat::DocumentTokens => "document_tokens",
        }
    }

    /// Value of docling's `--to` option.
    pub fn docling_target(&self) -> &'static str {
        match self {
            DocumentFormat::Markdown => "md",
            DocumentFormat::Html => "html",
            DocumentFormat::Dict => "json",
            DocumentFormat::Text => "text",
            DocumentFormat::DocumentTokens => "doctags",
        }
    }
}

/// Arguments of [`FileToDocumentTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentArgs {
    pub source: String,
    #[serde(default)]
    pub output_format: Option<String>,
}

/// Converts PDFs, office files, HTML and images into a structured document
/// and returns it in the requested representation.
#[derive(Debug, Clone)]
pub struct FileToDocumentTool {
    docling: ExternalProgram,
}

impl FileToDocumentTool {
    pub fn new(docling: &str) -> Self {
        Self {
            docling: ExternalProgram::new(docling, "for document conversion"),
        }
    }
}

impl Default for FileToDocumentTool {
    fn default() -> Self {
        Self::new("docling")
    }
}

/// Whether `source` should be fetched rather than read from disk.
fn is_remote(source: &str) -> bool {
    Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[async_trait]
impl TypedTool for FileToDocumentTool {
    type Args = DocumentArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "file_to_document_tool",
            "A tool for converting files from various formats (PDF, DOCX, XLSX, HTML, images, and more.) into \
             a unified document structured representation. The output can be formatted as Markdown, HTML, \
             plain text, dictionary, or a list of document tokens.\n\n\
             The source input can be a URL or a local file path.",
            ToolSchema::new()
                .required(
                    "source",
                    ParamType::String,
                    "A URL or local file path to the document to be converted.",
                )
                .optional(
                    "output_format",
                    ParamType::String,
                    "The desired output format. Supported values are: \
                     'markdown', 'dict', 'text', 'document_tokens', 'html'.",
                ),
        )
    }

    async fn run(&self, args: DocumentArgs) -> ToolResult {
        let requested = args.output_format.as_deref().unwrap_or("markdown");
        let format = DocumentFormat::parse(requested).ok_or_else(|| {
            ToolError::UnsupportedFormat(format!(
                "Unsupported output format: {}. Supported formats are: {}.",
                requested,
                DocumentFormat::ALL.map(|f| f.name()).join(", ")
            ))
        })?;

        if !is_remote(&args.source) {
            validate::input_file("Source document", &args.source)?;
        }

        let scratch = tempfile::tempdir()
            .map_err(|e| ToolError::io("Error creating a scratch directory", &e))?;
        self.docling
            .run([
                OsStr::new(&args.source),
                OsStr::new("--to"),
                OsStr::new(format.docling_target()),
                OsStr::new("--output"),
                scratch.path().as_os_str(),
            ])
            .await
            .map_err(|e| match e {
                ToolError::Generic(msg) => {
                    ToolError::Generic(format!("Error converting document: {}", msg))
                }
                other => other,
            })?;

        let produced = first_file(scratch.path())?;
        debug!("docling wrote {}", produced.display());
        let content = tokio::fs::read_to_string(&produced)
            .await
            .map_err(|e| ToolError::io("Error converting document", &e))?;

        info!("Converted {} to {} ({} bytes)", args.source, format.name(), content.len());
        Ok(content)
    }
}

/// The file docling wrote into its output directory.
fn first_file(dir: &Path) -> Result<PathBuf, ToolError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ToolError::io("Error converting document", &e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files.into_iter().next().ok_or_else(|| {
        ToolError::Generic("Error converting document: the converter produced no output.".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(DocumentFormat::parse("Markdown"), Some(DocumentFormat::Markdown));
        assert_eq!(DocumentFormat::parse("document_tokens"), Some(DocumentFormat::DocumentTokens));
        assert_eq!(DocumentFormat::parse("docx"), None);
        assert_eq!(DocumentFormat::Dict.docling_target(), "json");
    }

    #[test]
    fn test_remote_sources() {
        assert!(is_remote("https://arxiv.org/pdf/2408.09869"));
        assert!(!is_remote("/home/me/report.pdf"));
        assert!(!is_remote("C:\\docs\\report.pdf"));
        assert!(!is_remote("report.pdf"));
    }

    #[tokio::test]
    async fn test_format_checked_before_source() {
        let err = FileToDocumentTool::default()
            .run(DocumentArgs {
                source: "/nonexistent/report.pdf".to_string(),
                output_format: Some("docx".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported output format: docx. Supported formats are: dict, document_tokens, html, markdown, text."
        );
    }

    #[tokio::test]
    async fn test_missing_local_source() {
        let err = FileToDocumentTool::new("filewright-no-such-docling")
            .run(DocumentArgs {
                source: "/nonexistent/report.pdf".to_string(),
                output_format: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_missing_docling() {
        let err = FileToDocumentTool::new("filewright-no-such-docling")
            .run(DocumentArgs {
                source: "https://example.com/report.pdf".to_string(),
                output_format: Some("text".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "dependency_missing");
        assert!(err.to_string().contains("filewright-no-such-docling"));
    }

    #[test]
    fn test_first_file_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("artifacts")).unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        assert_eq!(first_file(dir.path()).unwrap().file_name(), Some(OsStr::new("a.md")));
    }
}
