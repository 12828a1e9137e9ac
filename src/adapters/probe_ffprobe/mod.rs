//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output and reads the first video stream's dimensions plus the
//! container duration.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::ExecutionError;
use crate::domain::model::MediaInfo;
use crate::ports::ProbePort;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Interpret `ffprobe -of json` output
pub fn parse_probe_output(json: &str) -> Result<MediaInfo, ExecutionError> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| ExecutionError::EngineFailure(format!("unreadable ffprobe output: {}", e)))?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.width.is_some() && s.height.is_some())
        .ok_or_else(|| ExecutionError::EngineFailure("no video stream found".into()))?;

    // Still images and some streams report no duration
    let duration = output
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    MediaInfo::new(
        stream.width.unwrap_or_default(),
        stream.height.unwrap_or_default(),
        duration,
    )
    .map_err(|e| ExecutionError::EngineFailure(e.to_string()))
}

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FfprobeAdapter {
    binary: PathBuf,
}

impl FfprobeAdapter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeAdapter {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, source: &Path) -> Result<MediaInfo, ExecutionError> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,duration:format=duration",
                "-of",
                "json",
            ])
            .arg(source)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ExecutionError::EngineFailure(format!(
                    "failed to spawn {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ExecutionError::EngineFailure(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            source = %source.display(),
            width = info.width,
            height = info.height,
            duration = info.duration_seconds,
            "Probed media"
        );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "programs": [],
            "streams": [{ "width": 1920, "height": 1080, "duration": "59.9" }],
            "format": { "duration": "60.041000" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info, MediaInfo::new(1920, 1080, 60.041).unwrap());
    }

    #[test]
    fn test_missing_duration_defaults_to_zero() {
        let json = r#"{ "streams": [{ "width": 640, "height": 480 }], "format": {} }"#;
        assert_eq!(parse_probe_output(json).unwrap().duration_seconds, 0.0);
    }

    #[test]
    fn test_audio_only_is_rejected() {
        let json = r#"{ "streams": [], "format": { "duration": "3.0" } }"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(ExecutionError::EngineFailure(_))
        ));
    }
}
