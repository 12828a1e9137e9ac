// Output options - container, codecs and quality of the produced artifact

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Webm,
    Mov,
    Gif,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "video/mp4",
            OutputFormat::Webm => "video/webm",
            OutputFormat::Mov => "video/quicktime",
            OutputFormat::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Webm => "webm",
            OutputFormat::Mov => "mov",
            OutputFormat::Gif => "gif",
        }
    }

    /// Guess the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp4" | "m4v" => Some(OutputFormat::Mp4),
            "webm" => Some(OutputFormat::Webm),
            "mov" => Some(OutputFormat::Mov),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| {
            ValidationError::IncompatibleOutput(format!(
                "unknown format '{}', expected mp4, webm, mov or gif",
                s
            ))
        })
    }
}

/// Video encoder family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    #[default]
    H264,
    H265,
    Vp9,
}

impl VideoCodec {
    /// ffmpeg encoder name
    pub fn encoder(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "libx264",
            VideoCodec::H265 => "libx265",
            VideoCodec::Vp9 => "libvpx-vp9",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "h264" | "avc" => Ok(VideoCodec::H264),
            "h265" | "hevc" => Ok(VideoCodec::H265),
            "vp9" => Ok(VideoCodec::Vp9),
            other => Err(ValidationError::IncompatibleOutput(format!(
                "unknown video codec '{}', expected h264, h265 or vp9",
                other
            ))),
        }
    }
}

/// Audio encoder family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    #[default]
    Aac,
    Mp3,
    Opus,
}

impl AudioCodec {
    pub fn encoder(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Mp3 => "libmp3lame",
            AudioCodec::Opus => "libopus",
        }
    }
}

impl FromStr for AudioCodec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aac" => Ok(AudioCodec::Aac),
            "mp3" => Ok(AudioCodec::Mp3),
            "opus" => Ok(AudioCodec::Opus),
            other => Err(ValidationError::IncompatibleOutput(format!(
                "unknown audio codec '{}', expected aac, mp3 or opus",
                other
            ))),
        }
    }
}

/// Quality ladder mapped onto CRF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Lossless,
    High,
    #[default]
    Medium,
    Low,
}

impl Quality {
    pub fn crf(&self) -> u8 {
        match self {
            Quality::Lossless => 0,
            Quality::High => 18,
            Quality::Medium => 23,
            Quality::Low => 28,
        }
    }
}

impl FromStr for Quality {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lossless" => Ok(Quality::Lossless),
            "high" => Ok(Quality::High),
            "medium" => Ok(Quality::Medium),
            "low" => Ok(Quality::Low),
            other => Err(ValidationError::IncompatibleOutput(format!(
                "unknown quality '{}', expected lossless, high, medium or low",
                other
            ))),
        }
    }
}

/// How the engine should encode the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub quality: Quality,
    /// Explicit CRF, overrides `quality`
    pub crf: Option<u8>,
    /// Encoder speed preset
    pub preset: String,
    pub fps: Option<u32>,
    pub include_audio: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp4,
            video_codec: VideoCodec::H264,
            audio_codec: AudioCodec::Aac,
            quality: Quality::Medium,
            crf: None,
            preset: "ultrafast".to_string(),
            fps: None,
            include_audio: true,
        }
    }
}

impl OutputOptions {
    const PRESETS: [&'static str; 9] = [
        "ultrafast",
        "superfast",
        "veryfast",
        "faster",
        "fast",
        "medium",
        "slow",
        "slower",
        "veryslow",
    ];

    /// Default options for a container, with a codec pairing that container accepts
    pub fn for_format(format: OutputFormat) -> Self {
        let mut options = Self {
            format,
            ..Self::default()
        };
        match format {
            OutputFormat::Webm => {
                options.video_codec = VideoCodec::Vp9;
                options.audio_codec = AudioCodec::Opus;
            }
            OutputFormat::Gif => options.include_audio = false,
            OutputFormat::Mp4 | OutputFormat::Mov => {}
        }
        options
    }

    pub fn effective_crf(&self) -> u8 {
        self.crf.unwrap_or_else(|| self.quality.crf())
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Reject combinations the container cannot hold
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(crf) = self.crf {
            if crf > 51 {
                return Err(ValidationError::IncompatibleOutput(format!(
                    "crf must be within 0..=51, got {}",
                    crf
                )));
            }
        }
        if !Self::PRESETS.contains(&self.preset.as_str()) {
            return Err(ValidationError::IncompatibleOutput(format!(
                "unknown encoder preset '{}'",
                self.preset
            )));
        }
        if self.fps == Some(0) {
            return Err(ValidationError::IncompatibleOutput(
                "fps must be positive".to_string(),
            ));
        }
        match self.format {
            OutputFormat::Webm => {
                if self.video_codec != VideoCodec::Vp9 {
                    return Err(ValidationError::IncompatibleOutput(
                        "webm output requires the vp9 video codec".to_string(),
                    ));
                }
                if self.include_audio && self.audio_codec != AudioCodec::Opus {
                    return Err(ValidationError::IncompatibleOutput(
                        "webm output requires the opus audio codec".to_string(),
                    ));
                }
            }
            OutputFormat::Gif => {
                if self.include_audio {
                    return Err(ValidationError::IncompatibleOutput(
                        "gif output cannot carry audio".to_string(),
                    ));
                }
            }
            OutputFormat::Mp4 | OutputFormat::Mov => {
                if self.include_audio && self.audio_codec == AudioCodec::Opus {
                    return Err(ValidationError::IncompatibleOutput(format!(
                        "{} output does not support opus audio",
                        self.format
                    )));
                }
            }
        }
        Ok(())
    }
}
