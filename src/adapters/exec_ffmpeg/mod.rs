//! FFmpeg execution adapter
//!
//! Drives the `ffmpeg` binary as a child process. Progress comes from `-progress pipe:1`
//! on stdout, stderr is drained concurrently and returned verbatim when the run fails.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::domain::model::*;
use crate::ports::*;
use crate::utils::time::{format_timestamp, parse_timestamp};

/// Render the full argument vector for one job, without the binary itself
pub fn build_args(job: &TranscodeJob, threads: Option<usize>) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    push(&mut args, &["-y", "-hide_banner", "-nostats"]);

    if let Some(trim) = &job.trim {
        push(
            &mut args,
            &[
                "-ss",
                &format_timestamp(trim.input_seek),
                "-t",
                &format_timestamp(trim.input_duration),
            ],
        );
    }

    push(&mut args, &["-i", &job.input.to_string_lossy()]);

    if let Some(graph) = &job.filter_graph {
        push(&mut args, &["-vf", graph]);
    }

    args.extend(codec_args(&job.options));

    if let Some(threads) = threads {
        push(&mut args, &["-threads", &threads.to_string()]);
    }

    push(
        &mut args,
        &["-progress", "pipe:1", &job.output.to_string_lossy()],
    );
    args
}

/// Encoder, quality, audio and muxer arguments for `options`
fn codec_args(options: &OutputOptions) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let crf = options.effective_crf().to_string();

    match options.format {
        OutputFormat::Gif => push(&mut args, &["-c:v", "gif"]),
        _ => {
            push(&mut args, &["-c:v", options.video_codec.encoder()]);
            match options.video_codec {
                VideoCodec::H264 | VideoCodec::H265 => push(
                    &mut args,
                    &["-preset", &options.preset, "-crf", &crf, "-pix_fmt", "yuv420p"],
                ),
                // Constant quality mode for libvpx needs a zero bitrate
                VideoCodec::Vp9 => push(&mut args, &["-crf", &crf, "-b:v", "0"]),
            }
        }
    }

    if let Some(fps) = options.fps {
        push(&mut args, &["-r", &fps.to_string()]);
    }

    if options.include_audio && options.format != OutputFormat::Gif {
        push(&mut args, &["-c:a", options.audio_codec.encoder()]);
    } else {
        push(&mut args, &["-an"]);
    }

    if matches!(options.format, OutputFormat::Mp4 | OutputFormat::Mov) {
        push(&mut args, &["-movflags", "+faststart"]);
    }

    let muxer = match options.format {
        OutputFormat::Mp4 => "mp4",
        OutputFormat::Webm => "webm",
        OutputFormat::Mov => "mov",
        OutputFormat::Gif => "gif",
    };
    push(&mut args, &["-f", muxer]);
    args
}

fn push(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|item| item.to_string()));
}

/// Turns `-progress` key=value lines into fractions of the expected duration
#[derive(Debug, Clone)]
pub struct ProgressParser {
    expected_duration: Option<f64>,
}

impl ProgressParser {
    pub fn new(expected_duration: Option<f64>) -> Self {
        Self {
            expected_duration: expected_duration.filter(|d| d.is_finite() && *d > 0.0),
        }
    }

    /// Fraction reported by `line`, if it carries one
    pub fn parse_line(&self, line: &str) -> Option<f64> {
        let (key, value) = line.trim().split_once('=')?;
        let seconds = match key {
            // out_time_ms is in microseconds as well
            "out_time_us" | "out_time_ms" => value.trim().parse::<i64>().ok()? as f64 / 1_000_000.0,
            "out_time" => parse_timestamp(value).ok()?,
            "progress" if value.trim() == "end" => return Some(1.0),
            _ => return None,
        };
        if seconds < 0.0 {
            return None;
        }
        let total = self.expected_duration?;
        Some((seconds / total).clamp(0.0, 1.0))
    }
}

/// FFmpeg-based execution adapter
#[derive(Debug, Clone)]
pub struct FfmpegCliAdapter {
    binary: PathBuf,
    threads: Option<usize>,
}

impl FfmpegCliAdapter {
    pub fn new(binary: impl Into<PathBuf>, threads: Option<usize>) -> Self {
        Self {
            binary: binary.into(),
            threads,
        }
    }

    /// Arguments this adapter would pass for `job`
    pub fn args_for(&self, job: &TranscodeJob) -> Vec<String> {
        build_args(job, self.threads)
    }
}

impl Default for FfmpegCliAdapter {
    fn default() -> Self {
        Self::new("ffmpeg", None)
    }
}

#[async_trait]
impl TranscodePort for FfmpegCliAdapter {
    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress: UnboundedSender<f64>,
    ) -> Result<(), EngineError> {
        let args = self.args_for(job);
        info!(
            binary = %self.binary.display(),
            input = %job.input.display(),
            filter_graph = job.filter_graph.as_deref().unwrap_or("-"),
            "Starting ffmpeg"
        );
        debug!(args = ?args, "ffmpeg arguments");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::new(format!("failed to spawn {}: {}", self.binary.display(), e))
            })?;

        // Drain stderr concurrently so a full pipe never blocks the child
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let parser = ProgressParser::new(job.expected_duration);
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(fraction) = parser.parse_line(&line) {
                    let _ = progress.send(fraction);
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::new(format!("failed to wait for ffmpeg: {}", e)))?;
        let stderr = match stderr_task {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            debug!("ffmpeg finished");
            Ok(())
        } else if stderr.trim().is_empty() {
            Err(EngineError::new(format!("ffmpeg exited with {}", status)))
        } else {
            Err(EngineError::new(stderr))
        }
    }
}
