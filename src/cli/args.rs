//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Subcommand};
use clap_num::number_range;

use crate::domain::errors::ValidationError;
use crate::domain::model::{OutputFormat, OutputOptions};

fn parse_crf(s: &str) -> Result<u8, String> {
    number_range(s, 0, 51)
}

/// Export options shared by `process` and `batch`. Unset flags keep the configured defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output container (mp4, webm, mov, gif)
    #[arg(long)]
    pub format: Option<String>,

    /// Video codec (h264, h265, vp9)
    #[arg(long)]
    pub codec: Option<String>,

    /// Audio codec (aac, mp3, opus)
    #[arg(long)]
    pub audio_codec: Option<String>,

    /// Quality level (lossless, high, medium, low)
    #[arg(long)]
    pub quality: Option<String>,

    /// Constant Rate Factor (0-51), overrides --quality
    #[arg(long, value_parser = parse_crf)]
    pub crf: Option<u8>,

    /// Encoder speed preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Drop the audio track
    #[arg(long)]
    pub no_audio: bool,
}

impl OutputArgs {
    /// Layer these flags over `base`. `implied_format` applies when --format is absent.
    pub fn resolve(
        &self,
        base: &OutputOptions,
        implied_format: Option<OutputFormat>,
    ) -> Result<OutputOptions, ValidationError> {
        let format = match &self.format {
            Some(format) => Some(format.parse::<OutputFormat>()?),
            None => implied_format,
        };

        let mut options = match format {
            Some(format) if format != base.format => OutputOptions {
                quality: base.quality,
                crf: base.crf,
                preset: base.preset.clone(),
                fps: base.fps,
                ..OutputOptions::for_format(format)
            },
            _ => base.clone(),
        };

        if let Some(codec) = &self.codec {
            options.video_codec = codec.parse()?;
        }
        if let Some(codec) = &self.audio_codec {
            options.audio_codec = codec.parse()?;
        }
        if let Some(quality) = &self.quality {
            options.quality = quality.parse()?;
        }
        if self.crf.is_some() {
            options.crf = self.crf;
        }
        if let Some(preset) = &self.preset {
            options.preset = preset.clone();
        }
        if self.fps.is_some() {
            options.fps = self.fps;
        }
        if self.no_audio {
            options.include_audio = false;
        }

        options.validate()?;
        Ok(options)
    }
}

/// Arguments for the compile command
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Operation file (JSON or YAML)
    #[arg(long)]
    pub ops: PathBuf,

    /// Source video, probed for crop dimensions
    #[arg(short, long, conflicts_with_all = ["width", "height"])]
    pub input: Option<PathBuf>,

    /// Source width in pixels, instead of probing
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Source height in pixels, instead of probing
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Operation file (JSON or YAML)
    #[arg(long)]
    pub ops: PathBuf,

    /// Output file path; its extension picks the format unless --format is given
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Operation file (JSON or YAML)
    #[arg(long)]
    pub ops: PathBuf,

    /// Directory receiving one output per input
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Input video files
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the presets command
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Print the operations of one preset as JSON
    #[arg(long)]
    pub show: Option<String>,
}

/// Arguments for the project command
#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Save an operation file as a named project
    Save {
        /// Operation file (JSON or YAML)
        #[arg(long)]
        ops: PathBuf,

        /// Project name
        #[arg(long)]
        name: String,

        /// Project file to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a project file
    Show {
        /// Project file
        path: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
