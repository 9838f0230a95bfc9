//! Audio and video transcoding through ffmpeg.

use crate::tools::external::ExternalProgram;
use crate::tools::paths::{resolve_output, ResolvedOutput};
use crate::tools::result::{ToolError, ToolResult};
use crate::tools::schema::{ParamType, ToolDescriptor, ToolSchema};
use crate::tools::staging::StagedFile;
use crate::tools::validate;
use crate::tools::TypedTool;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

const FFMPEG_PURPOSE: &str = "for audio and video conversion";

/// Default encoder for an audio container.
pub fn default_audio_codec(format: &str) -> Option<&'static str> {
    match format {
        "mp3" => Some("libmp3lame"),
        "wav" => Some("pcm_s16le"),
        "ogg" => Some("libvorbis"),
        "flac" => Some("flac"),
        "aac" | "m4a" => Some("aac"),
        _ => None,
    }
}

/// Default video encoder for a video container.
pub fn default_video_codec(format: &str) -> Option<&'static str> {
    match format {
        "mp4" | "mkv" | "mov" => Some("libx264"),
        "avi" => Some("mpeg4"),
        "webm" => Some("libvpx"),
        "flv" => Some("flv"),
        _ => None,
    }
}

/// Default audio encoder for a video container.
pub fn default_video_audio_codec(format: &str) -> Option<&'static str> {
    match format {
        "mp4" | "mkv" | "mov" | "flv" => Some("aac"),
        "avi" => Some("mp3"),
        "webm" => Some("libvorbis"),
        _ => None,
    }
}

fn resolution_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$").expect("valid regex"))
}

/// Parse a `<width>x<height>` resolution.
pub fn parse_resolution(raw: &str) -> Result<(u32, u32), ToolError> {
    let invalid = || {
        ToolError::InvalidArgument(format!(
            "Invalid resolution format '{}'. Use format like '1920x1080'.",
            raw
        ))
    };
    let caps = resolution_regex().captures(raw).ok_or_else(invalid)?;
    let width: u32 = caps[1].parse().map_err(|_| invalid())?;
    let height: u32 = caps[2].parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

/// Arguments of [`AudioConverterTool`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioArgs {
    pub source_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub bitrate: Option<String>,
    #[serde(default)]
    pub sample_rate: Option<u32>,
}

/// ffmpeg arguments for an audio conversion. Output is always overwritten.
pub fn audio_args(source: &Path, output: &Path, format: &str, args: &AudioArgs) -> Vec<OsString> {
    let mut cmd: Vec<OsString> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    cmd.push("-i".into());
    cmd.push(source.into());

    let codec = non_empty(&args.codec).or_else(|| default_audio_codec(format));
    if let Some(codec) = codec {
        cmd.extend(["-acodec".into(), codec.into()]);
    }
    if let Some(bitrate) = non_empty(&args.bitrate) {
        cmd.extend(["-b:a".into(), bitrate.into()]);
    }
    if let Some(rate) = args.sample_rate.filter(|r| *r > 0) {
        cmd.extend(["-ar".into(), rate.to_string().into()]);
    }

    cmd.push("-y".into());
    cmd.push(output.into());
    cmd
}

/// Arguments of [`VideoConverterTool`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoArgs {
    pub source_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub video_bitrate: Option<String>,
    #[serde(default)]
    pub audio_bitrate: Option<String>,
}

/// ffmpeg arguments for a video conversion. Output is always overwritten.
pub fn video_args(
    source: &Path,
    output: &Path,
    format: &str,
    args: &VideoArgs,
) -> Result<Vec<OsString>, ToolError> {
    let mut cmd: Vec<OsString> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    cmd.push("-i".into());
    cmd.push(source.into());

    if let Some(codec) = non_empty(&args.video_codec).or_else(|| default_video_codec(format)) {
        cmd.extend(["-vcodec".into(), codec.into()]);
    }
    if let Some(codec) = non_empty(&args.audio_codec).or_else(|| default_video_audio_codec(format)) {
        cmd.extend(["-acodec".into(), codec.into()]);
    }
    if let Some(resolution) = non_empty(&args.resolution) {
        let (width, height) = parse_resolution(resolution)?;
        cmd.extend(["-s".into(), format!("{}x{}", width, height).into()]);
    }
    if let Some(bitrate) = non_empty(&args.video_bitrate) {
        cmd.extend(["-b:v".into(), bitrate.into()]);
    }
    if let Some(bitrate) = non_empty(&args.audio_bitrate) {
        cmd.extend(["-b:a".into(), bitrate.into()]);
    }

    cmd.push("-y".into());
    cmd.push(output.into());
    Ok(cmd)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Run ffmpeg into a staged copy of the output, then move it into place.
async fn transcode<F>(ffmpeg: &ExternalProgram, output: &ResolvedOutput, build: F) -> Result<(), ToolError>
where
    F: FnOnce(&Path) -> Result<Vec<OsString>, ToolError>,
{
    let staged = StagedFile::new(&output.path)?;
    let args = build(staged.path())?;
    ffmpeg.run(args).await.map_err(|e| match e {
        ToolError::Generic(msg) => ToolError::Generic(format!("Error in FFmpeg conversion: {}", msg)),
        other => other,
    })?;
    staged.commit()?;
    Ok(())
}

/// Converts audio between containers and codecs.
#[derive(Debug, Clone)]
pub struct AudioConverterTool {
    ffmpeg: ExternalProgram,
}

impl AudioConverterTool {
    pub fn new(ffmpeg: &str) -> Self {
        Self {
            ffmpeg: ExternalProgram::new(ffmpeg, FFMPEG_PURPOSE),
        }
    }
}

impl Default for AudioConverterTool {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TypedTool for AudioConverterTool {
    type Args = AudioArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "audio_format_converter_tool",
            "A tool for converting audio files between different formats. \
             This tool takes an input audio file and converts it to the specified output format. \
             It can automatically determine the output format based on the extension of the output path. \
             Supports common audio formats like MP3, WAV, OGG, FLAC, AAC, and M4A. \
             Optional codec specification allows for more control over the conversion process.",
            ToolSchema::new()
                .required(
                    "source_path",
                    ParamType::String,
                    "The full path to the input audio file.",
                )
                .optional(
                    "output_path",
                    ParamType::String,
                    "The full path where the converted audio should be saved. \
                     If provided, the format will be determined from the extension.",
                )
                .optional(
                    "output_format",
                    ParamType::String,
                    "The desired output format (e.g., 'mp3', 'wav', 'ogg'). \
                     Only needed if output_path doesn't have an extension.",
                )
                .optional(
                    "codec",
                    ParamType::String,
                    "Specific audio codec to use for encoding (e.g., 'libmp3lame' for MP3, \
                     'pcm_s16le' for WAV). If not provided, a default codec for the format will be used.",
                )
                .optional(
                    "bitrate",
                    ParamType::String,
                    "The bitrate for the output file (e.g., '192k', '320k'). \
                     Higher values mean better quality but larger files.",
                )
                .optional(
                    "sample_rate",
                    ParamType::Integer,
                    "Sample rate in Hz (e.g., 44100, 48000). \
                     If not provided, the source sample rate will be preserved.",
                ),
        )
    }

    async fn run(&self, args: AudioArgs) -> ToolResult {
        let source = validate::input_file("Source audio file", &args.source_path)?;
        let output = resolve_output(
            &source,
            args.output_path.as_deref(),
            args.output_format.as_deref(),
        )?;

        transcode(&self.ffmpeg, &output, |staged| {
            Ok(audio_args(&source, staged, &output.format, &args))
        })
        .await?;

        info!("Converted {} -> {}", args.source_path, output.path.display());
        Ok(format!(
            "Audio successfully converted from {} to {}",
            args.source_path,
            output.path.display()
        ))
    }
}

/// Converts video between containers, codecs and resolutions.
#[derive(Debug, Clone)]
pub struct VideoConverterTool {
    ffmpeg: ExternalProgram,
}

impl VideoConverterTool {
    pub fn new(ffmpeg: &str) -> Self {
        Self {
            ffmpeg: ExternalProgram::new(ffmpeg, FFMPEG_PURPOSE),
        }
    }
}

impl Default for VideoConverterTool {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TypedTool for VideoConverterTool {
    type Args = VideoArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "video_format_converter_tool",
            "A tool for converting video files between different formats. \
             This tool takes an input video file and converts it to the specified output format. \
             It can automatically determine the output format based on the extension of the output path. \
             Supports common video formats like MP4, AVI, MKV, MOV, WebM, and FLV. \
             Allows specifying video and audio codecs, resolution, and bitrates for fine-tuned conversions.",
            ToolSchema::new()
                .required(
                    "source_path",
                    ParamType::String,
                    "The full path to the input video file.",
                )
                .optional(
                    "output_path",
                    ParamType::String,
                    "The full path where the converted video should be saved. \
                     If provided, the format will be determined from the extension.",
                )
                .optional(
                    "output_format",
                    ParamType::String,
                    "The desired output format (e.g., 'mp4', 'avi', 'mkv'). \
                     Only needed if output_path doesn't have an extension.",
                )
                .optional(
                    "video_codec",
                    ParamType::String,
                    "Video codec to use (e.g., 'h264', 'vp9', 'hevc'). \
                     If not provided, a default codec for the format will be used.",
                )
                .optional(
                    "audio_codec",
                    ParamType::String,
                    "Audio codec to use (e.g., 'aac', 'mp3'). \
                     If not provided, a default codec for the format will be used.",
                )
                .optional(
                    "resolution",
                    ParamType::String,
                    "Target resolution in format 'widthxheight' (e.g., '1920x1080', '720x480'). \
                     If not provided, the source resolution will be preserved.",
                )
                .optional(
                    "video_bitrate",
                    ParamType::String,
                    "Target video bitrate (e.g., '2M', '5000k'). \
                     Higher values mean better quality but larger files.",
                )
                .optional(
                    "audio_bitrate",
                    ParamType::String,
                    "Target audio bitrate (e.g., '192k', '320k').",
                ),
        )
    }

    async fn run(&self, args: VideoArgs) -> ToolResult {
        let source = validate::input_file("Source video file", &args.source_path)?;
        if let Some(resolution) = non_empty(&args.resolution) {
            parse_resolution(resolution)?;
        }
        let output = resolve_output(
            &source,
            args.output_path.as_deref(),
            args.output_format.as_deref(),
        )?;

        transcode(&self.ffmpeg, &output, |staged| {
            video_args(&source, staged, &output.format, &args)
        })
        .await?;

        info!("Converted {} -> {}", args.source_path, output.path.display());
        Ok(format!(
            "Video successfully converted from {} to {}",
            args.source_path,
            output.path.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn flag_value(args: &[String], flag: &str) -> Option<String> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1).cloned())
    }

    #[test]
    fn test_default_codecs() {
        assert_eq!(default_audio_codec("wav"), Some("pcm_s16le"));
        assert_eq!(default_audio_codec("m4a"), Some("aac"));
        assert_eq!(default_audio_codec("opus"), None);
        assert_eq!(default_video_codec("webm"), Some("libvpx"));
        assert_eq!(default_video_audio_codec("avi"), Some("mp3"));
    }

    #[test]
    fn test_audio_args_use_format_default_codec() {
        let args = AudioArgs {
            source_path: "in.wav".into(),
            bitrate: Some("192k".into()),
            sample_rate: Some(44100),
            ..Default::default()
        };
        let cmd = strings(&audio_args(Path::new("in.wav"), Path::new("out.mp3"), "mp3", &args));

        assert_eq!(flag_value(&cmd, "-i").as_deref(), Some("in.wav"));
        assert_eq!(flag_value(&cmd, "-acodec").as_deref(), Some("libmp3lame"));
        assert_eq!(flag_value(&cmd, "-b:a").as_deref(), Some("192k"));
        assert_eq!(flag_value(&cmd, "-ar").as_deref(), Some("44100"));
        assert!(cmd.contains(&"-y".to_string()));
        assert_eq!(cmd.last().map(String::as_str), Some("out.mp3"));
    }

    #[test]
    fn test_audio_args_explicit_codec_wins() {
        let args = AudioArgs {
            source_path: "in.wav".into(),
            codec: Some("libshine".into()),
            ..Default::default()
        };
        let cmd = strings(&audio_args(Path::new("in.wav"), Path::new("out.mp3"), "mp3", &args));
        assert_eq!(flag_value(&cmd, "-acodec").as_deref(), Some("libshine"));
        assert_eq!(flag_value(&cmd, "-b:a"), None);
    }

    #[test]
    fn test_video_args() {
        let args = VideoArgs {
            source_path: "in.mov".into(),
            resolution: Some("1280x720".into()),
            video_bitrate: Some("2M".into()),
            ..Default::default()
        };
        let cmd = strings(&video_args(Path::new("in.mov"), Path::new("out.webm"), "webm", &args).unwrap());
        assert_eq!(flag_value(&cmd, "-vcodec").as_deref(), Some("libvpx"));
        assert_eq!(flag_value(&cmd, "-acodec").as_deref(), Some("libvorbis"));
        assert_eq!(flag_value(&cmd, "-s").as_deref(), Some("1280x720"));
        assert_eq!(flag_value(&cmd, "-b:v").as_deref(), Some("2M"));
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_resolution("720X480").unwrap(), (720, 480));
        for bad in ["1920", "x1080", "axb", "0x10", "1920x1080x3"] {
            let err = parse_resolution(bad).unwrap_err();
            assert!(err.to_string().contains(bad), "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_bad_resolution_rejected_before_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mov");
        std::fs::write(&source, b"not really a video").unwrap();

        let err = VideoConverterTool::new("filewright-no-such-ffmpeg")
            .run(VideoArgs {
                source_path: source.to_str().unwrap().to_string(),
                output_format: Some("mp4".into()),
                resolution: Some("big".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(!dir.path().join("clip.mp4").exists());
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("song.wav");
        std::fs::write(&source, b"RIFF").unwrap();

        let err = AudioConverterTool::new("filewright-no-such-ffmpeg")
            .run(AudioArgs {
                source_path: source.to_str().unwrap().to_string(),
                output_format: Some("mp3".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "dependency_missing");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
