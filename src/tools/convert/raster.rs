//! Image re-encoding with the `image` crate.

use crate::tools::paths::resolve_output;
use crate::tools::result::{ToolError, ToolResult};
use crate::tools::schema::{ParamType, ToolDescriptor, ToolSchema};
use crate::tools::staging::StagedFile;
use crate::tools::validate;
use crate::tools::{blocking, TypedTool};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};
use serde::Deserialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Arguments of [`ImageConverterTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConvertArgs {
    pub source_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImageConverterTool;

#[async_trait]
impl TypedTool for ImageConverterTool {
    type Args = ImageConvertArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "image_format_converter_tool",
            "A tool for converting images between different formats. \
             This tool takes an input image file and converts it to the specified output format. \
             It can automatically determine the output format based on the extension of the output path. \
             Supports common image formats like PNG, JPEG, GIF, BMP, TIFF, and WebP.",
            ToolSchema::new()
                .required(
                    "source_path",
                    ParamType::String,
                    "The full path to the input image file.",
                )
                .optional(
                    "output_path",
                    ParamType::String,
                    "The full path where the converted image should be saved. \
                     If provided, the format will be determined from the extension.",
                )
                .optional(
                    "output_format",
                    ParamType::String,
                    "The desired output format (e.g., 'png', 'jpg', 'gif'). \
                     Only needed if output_path doesn't have an extension.",
                ),
        )
    }

    async fn run(&self, args: ImageConvertArgs) -> ToolResult {
        let source = validate::input_file("Source image", &args.source_path)?;
        let output = resolve_output(
            &source,
            args.output_path.as_deref(),
            args.output_format.as_deref(),
        )?;
        let format = target_format(&output.format)?;

        let target = output.path.clone();
        blocking("converting image", move || convert(&source, &target, format)).await?;

        info!("Converted {} -> {}", args.source_path, output.path.display());
        Ok(format!(
            "Image successfully converted from {} to {}",
            args.source_path,
            output.path.display()
        ))
    }
}

/// Map a format token to an encodable image format.
fn target_format(token: &str) -> Result<ImageFormat, ToolError> {
    ImageFormat::from_extension(token)
        .filter(|format| format.writing_enabled())
        .ok_or_else(|| {
            ToolError::UnsupportedFormat(format!(
                "Unsupported image output format '{}'.",
                token
            ))
        })
}

fn keeps_alpha(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP)
}

fn convert(source: &Path, target: &Path, format: ImageFormat) -> Result<(), ToolError> {
    let decoded = ImageReader::open(source)
        .map_err(|e| ToolError::io(format!("Error opening '{}'", source.display()), &e))?
        .with_guessed_format()
        .map_err(|e| ToolError::io(format!("Error reading '{}'", source.display()), &e))?
        .decode()
        .map_err(|e| {
            ToolError::UnsupportedFormat(format!(
                "Cannot decode image '{}': {}",
                source.display(),
                e
            ))
        })?;

    let prepared = if keeps_alpha(format) && decoded.color().has_alpha() {
        DynamicImage::ImageRgba8(decoded.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(decoded.to_rgb8())
    };

    let mut staged = StagedFile::new(target)?;
    {
        let mut writer = BufWriter::new(staged.file_mut());
        prepared
            .write_to(&mut writer, format)
            .map_err(|e| ToolError::Generic(format!("Error converting image: {}", e)))?;
        writer
            .flush()
            .map_err(|e| ToolError::io(format!("Error writing '{}'", target.display()), &e))?;
    }
    staged.commit()?;
    Ok(())
}
