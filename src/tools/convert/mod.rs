//! Format conversion tools: images, audio, video and documents.

mod document;
mod media;
mod raster;

pub use document::{DocumentArgs, DocumentFormat, FileToDocumentTool};
pub use media::{
    audio_args, default_audio_codec, default_video_audio_codec, default_video_codec,
    parse_resolution, video_args, AudioArgs, AudioConverterTool, VideoArgs, VideoConverterTool,
};
pub use raster::{ImageConvertArgs, ImageConverterTool};
