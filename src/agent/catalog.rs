//! The built-in agents and the registry that resolves them by name.

use super::descriptor::{AgentDescriptor, AgentLimits, ModelRef};
use crate::config::{ModelConfig, Settings};
use crate::error::{FilewrightError, Result};
use crate::openai::create_client;
use crate::tools::convert::{
    AudioConverterTool, FileToDocumentTool, ImageConverterTool, VideoConverterTool,
};
use crate::tools::filesystem::{CopyFileTool, DeleteFileTool, RenameFileTool};
use crate::tools::image_gen::{GenerateImageTool, OpenAiImageGenerator};
use crate::tools::pdf::{AddPasswordTool, MergePdfTool, RotatePdfTool, SplitPdfTool, WatermarkPdfTool};
use crate::tools::ToolSet;
use std::sync::Arc;

pub const FILE_CONVERTER: &str = "FileConverter";
pub const FILE_ORGANIZER: &str = "FileOrganizer";
pub const PDF_EDITOR: &str = "PdfEditor";
pub const IMAGE_CREATOR: &str = "ImageCreator";
pub const FILE_ORCHESTRATOR: &str = "FileOrchestrator";

fn model_ref(config: &ModelConfig) -> ModelRef {
    ModelRef::new(config.name.clone(), config.max_tokens)
}

fn worker_limits(max_steps: usize, planning_interval: Option<usize>) -> AgentLimits {
    AgentLimits {
        max_steps,
        planning_interval,
    }
}

fn file_converter(settings: &Settings) -> Result<AgentDescriptor> {
    let programs = &settings.programs;
    let tools = ToolSet::new()
        .with(FileToDocumentTool::new(&programs.docling))?
        .with(ImageConverterTool)?
        .with(AudioConverterTool::new(&programs.ffmpeg))?
        .with(VideoConverterTool::new(&programs.ffmpeg))?;

    Ok(AgentDescriptor::tool_calling(
        FILE_CONVERTER,
        "Converts files from one format to another.",
        model_ref(&settings.models.worker),
        tools,
        worker_limits(20, None),
    ))
}

fn file_organizer(settings: &Settings) -> Result<AgentDescriptor> {
    let tools = ToolSet::new()
        .with(RenameFileTool)?
        .with(CopyFileTool)?
        .with(DeleteFileTool)?;

    Ok(AgentDescriptor::tool_calling(
        FILE_ORGANIZER,
        "Organizes and manages files in the local file system.",
        model_ref(&settings.models.worker),
        tools,
        worker_limits(20, None),
    ))
}

fn pdf_editor(settings: &Settings) -> Result<AgentDescriptor> {
    let tools = ToolSet::new()
        .with(MergePdfTool)?
        .with(SplitPdfTool)?
        .with(RotatePdfTool)?
        .with(WatermarkPdfTool)?
        .with(AddPasswordTool::new(&settings.programs.qpdf))?;

    Ok(AgentDescriptor::tool_calling(
        PDF_EDITOR,
        "Edits PDF files such as merging, splitting, rotating, watermarking, and adding password protection.",
        model_ref(&settings.models.worker),
        tools,
        worker_limits(20, None),
    ))
}

fn image_creator(settings: &Settings) -> Result<AgentDescriptor> {
    let client = create_client(&settings.openai)?;
    let generator = OpenAiImageGenerator::new(client, settings.openai.image_model.clone());
    let tools = ToolSet::new().with(GenerateImageTool::new(Arc::new(generator)))?;

    Ok(AgentDescriptor::tool_calling(
        IMAGE_CREATOR,
        "Creates and saves AI-generated images based on text descriptions.",
        model_ref(&settings.models.worker),
        tools,
        worker_limits(15, Some(3)),
    ))
}

fn file_orchestrator(settings: &Settings) -> Result<AgentDescriptor> {
    let registry = AgentRegistry::builtin();
    let managed = [FILE_CONVERTER, FILE_ORGANIZER, PDF_EDITOR, IMAGE_CREATOR]
        .into_iter()
        .map(|name| registry.descriptor(name, settings))
        .collect::<Result<Vec<_>>>()?;

    Ok(AgentDescriptor::orchestrator(
        FILE_ORCHESTRATOR,
        "Orchestrates file conversion and organization agents.",
        model_ref(&settings.models.orchestrator),
        managed,
        worker_limits(15, Some(5)),
    ))
}

type Constructor = fn(&Settings) -> Result<AgentDescriptor>;

/// A registered agent.
#[derive(Clone, Copy)]
pub struct AgentEntry {
    pub name: &'static str,
    pub summary: &'static str,
    constructor: Constructor,
}

const fn entry(name: &'static str, summary: &'static str, constructor: Constructor) -> AgentEntry {
    AgentEntry {
        name,
        summary,
        constructor,
    }
}

/// Startup-time table of agents, keyed by name.
pub struct AgentRegistry {
    entries: Vec<AgentEntry>,
}

impl AgentRegistry {
    /// The built-in agents.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                entry(FILE_CONVERTER, "Converts documents, images, audio and video.", file_converter),
                entry(FILE_ORGANIZER, "Renames, copies and deletes files.", file_organizer),
                entry(PDF_EDITOR, "Merges, splits, rotates, watermarks and encrypts PDFs.", pdf_editor),
                entry(IMAGE_CREATOR, "Generates images from text descriptions.", image_creator),
                entry(FILE_ORCHESTRATOR, "Delegates file tasks to the other agents.", file_orchestrator),
            ],
        }
    }

    pub fn entries(&self) -> &[AgentEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Build the descriptor for `name`, applying configured overrides.
    pub fn descriptor(&self, name: &str, settings: &Settings) -> Result<AgentDescriptor> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| FilewrightError::UnknownAgent {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;

        let overrides = settings.agent_override(entry.name);
        let descriptor = (entry.constructor)(settings)?.with_overrides(
            overrides.model.as_deref(),
            overrides.max_tokens,
            overrides.max_steps,
            overrides.planning_interval,
        );
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::descriptor::AgentKind;
    use crate::config::AgentOverride;

    #[test]
    fn test_unknown_agent() {
        let err = AgentRegistry::builtin()
            .descriptor("Nope", &Settings::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown agent 'Nope'; available agents: FileConverter, FileOrganizer, PdfEditor, ImageCreator, FileOrchestrator"
        );
    }

    #[test]
    fn test_worker_agents() {
        let registry = AgentRegistry::builtin();
        let settings = Settings::default();

        let converter = registry.descriptor("FileConverter", &settings).unwrap();
        assert_eq!(
            converter.tools.names(),
            vec![
                "file_to_document_tool",
                "image_format_converter_tool",
                "audio_format_converter_tool",
                "video_format_converter_tool"
            ]
        );
        assert_eq!(converter.model, ModelRef::new("gpt-4o-mini", 2048));
        assert_eq!(converter.limits, worker_limits(20, None));

        let organizer = registry.descriptor("fileorganizer", &settings).unwrap();
        assert_eq!(organizer.tools.len(), 3);

        let pdf = registry.descriptor("PdfEditor", &settings).unwrap();
        assert_eq!(pdf.tools.len(), 5);
        assert!(pdf.tools.get("add_password_to_pdf_tool").is_some());

        let images = registry.descriptor("ImageCreator", &settings).unwrap();
        assert_eq!(images.tools.names(), vec!["generate_image_tool"]);
        assert_eq!(images.limits, worker_limits(15, Some(3)));
    }

    #[test]
    fn test_orchestrator_manages_workers() {
        let orchestrator = AgentRegistry::builtin()
            .descriptor("FileOrchestrator", &Settings::default())
            .unwrap();

        assert_eq!(orchestrator.kind, AgentKind::Orchestrator);
        assert!(orchestrator.tools.is_empty());
        assert_eq!(orchestrator.model, ModelRef::new("gpt-4o", 8096));
        assert_eq!(orchestrator.limits, worker_limits(15, Some(5)));
        let managed: Vec<_> = orchestrator.managed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(managed, vec!["FileConverter", "FileOrganizer", "PdfEditor", "ImageCreator"]);
    }

    #[test]
    fn test_overrides_apply_to_managed_agents() {
        let mut settings = Settings::default();
        settings.agents.insert(
            "PdfEditor".to_string(),
            AgentOverride {
                max_steps: Some(4),
                ..Default::default()
            },
        );

        let orchestrator = AgentRegistry::builtin()
            .descriptor("FileOrchestrator", &settings)
            .unwrap();
        let pdf = orchestrator.managed.iter().find(|a| a.name == "PdfEditor").unwrap();
        assert_eq!(pdf.limits.max_steps, 4);
    }
}
