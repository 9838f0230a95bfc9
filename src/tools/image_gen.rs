//! Text-to-image generation.

use super::paths::extension_of;
use super::result::{ToolError, ToolResult};
use super::schema::{ParamType, ToolDescriptor, ToolSchema};
use super::staging::StagedFile;
use super::validate;
use super::{blocking, TypedTool};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateImageRequestArgs, ImageModel, ImageResponseFormat, ImageSize};
use async_openai::Client;
use async_trait::async_trait;
use image::ImageFormat;
use serde::Deserialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Produces PNG images from text prompts.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for `prompt`, returning PNG bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ToolError>;
}

/// Image generation through the OpenAI images endpoint.
pub struct OpenAiImageGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiImageGenerator {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn image_model(&self) -> ImageModel {
        match self.model.as_str() {
            "dall-e-2" => ImageModel::DallE2,
            "dall-e-3" => ImageModel::DallE3,
            other => ImageModel::Other(other.to_string()),
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ToolError> {
        let api_error = |e: async_openai::error::OpenAIError| {
            ToolError::Generic(format!("Error generating image: {}", e))
        };

        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(self.image_model())
            .n(1)
            .size(ImageSize::S1024x1024)
            .response_format(ImageResponseFormat::B64Json)
            .build()
            .map_err(api_error)?;

        debug!("Requesting image from {}", self.model);
        let response = self.client.images().create(request).await.map_err(api_error)?;

        let scratch = tempfile::tempdir()
            .map_err(|e| ToolError::io("Error creating a scratch directory", &e))?;
        let saved = response.save(scratch.path()).await.map_err(api_error)?;
        let path = saved.first().ok_or_else(|| {
            ToolError::Generic("Error generating image: the API returned no image.".to_string())
        })?;

        tokio::fs::read(path)
            .await
            .map_err(|e| ToolError::io("Error reading the generated image", &e))
    }
}

/// Arguments of [`GenerateImageTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateImageArgs {
    pub prompt: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Generates an image and saves it to disk.
#[derive(Clone)]
pub struct GenerateImageTool {
    generator: Arc<dyn ImageGenerator>,
}

impl GenerateImageTool {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl TypedTool for GenerateImageTool {
    type Args = GenerateImageArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "generate_image_tool",
            "A tool for generating an image from a text description and saving it to disk. \
             Provide a detailed prompt and optionally the desired filename including extension. \
             If no filename is provided, a unique filename will be generated.",
            ToolSchema::new()
                .required(
                    "prompt",
                    ParamType::String,
                    "A detailed description of the image to generate.",
                )
                .optional(
                    "filename",
                    ParamType::String,
                    "The desired filename including extension (e.g., 'my_image.png').",
                )
                .optional(
                    "output_dir",
                    ParamType::String,
                    "Directory where the image should be saved. Defaults to current working directory.",
                ),
        )
    }

    async fn run(&self, args: GenerateImageArgs) -> ToolResult {
        if args.prompt.trim().is_empty() {
            return Err(ToolError::InvalidArgument(
                "The image prompt must not be empty.".to_string(),
            ));
        }

        let target = target_path(args.filename.as_deref(), args.output_dir.as_deref())?;
        let format = match extension_of(&target) {
            Some(ext) => ImageFormat::from_extension(&ext)
                .filter(|f| f.writing_enabled())
                .ok_or_else(|| {
                    ToolError::UnsupportedFormat(format!("Unsupported image output format '{}'.", ext))
                })?,
            None => ImageFormat::Png,
        };

        let png = self.generator.generate(&args.prompt).await?;

        let destination = target.clone();
        blocking("saving image", move || save_image(png, &destination, format)).await?;

        info!("Generated image saved to {}", target.display());
        Ok(format!("Image saved successfully at: {}", target.display()))
    }
}

/// Resolve where the generated image goes, creating the directory.
fn target_path(filename: Option<&str>, output_dir: Option<&str>) -> Result<PathBuf, ToolError> {
    let dir = match output_dir.map(str::trim).filter(|d| !d.is_empty()) {
        Some(dir) => validate::check("Output directory", dir, &[validate::Expect::Directory])?,
        None => std::env::current_dir()
            .map_err(|e| ToolError::io("Error resolving the current directory", &e))?,
    };
    validate::ensure_dir(&dir)?;

    let filename = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("image_{}.png", Uuid::new_v4().simple()),
    };
    Ok(dir.join(filename))
}

fn save_image(png: Vec<u8>, target: &Path, format: ImageFormat) -> Result<(), ToolError> {
    validate::ensure_parent_dir(target)?;
    let mut staged = StagedFile::new(target)?;
    let write_error = |e: String| ToolError::Generic(format!("Error saving image: {}", e));

    {
        let mut writer = BufWriter::new(staged.file_mut());
        if format == ImageFormat::Png {
            writer.write_all(&png).map_err(|e| write_error(e.to_string()))?;
        } else {
            let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
                .map_err(|e| write_error(e.to_string()))?;
            let prepared = match format {
                ImageFormat::Gif | ImageFormat::WebP => decoded,
                _ => image::DynamicImage::ImageRgb8(decoded.to_rgb8()),
            };
            prepared
                .write_to(&mut writer, format)
                .map_err(|e| write_error(e.to_string()))?;
        }
        writer.flush().map_err(|e| write_error(e.to_string()))?;
    }

    staged.commit()?;
    Ok(())
}
