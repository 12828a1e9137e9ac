// Probe LibAV adapter - In-process media probing through ffmpeg-next

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use tracing::debug;

use crate::domain::errors::ExecutionError;
use crate::domain::model::MediaInfo;
use crate::ports::ProbePort;

/// LibAV-based media probing adapter
#[derive(Debug, Clone, Default)]
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Initialize libav and create the adapter
    pub fn new() -> Result<Self, ExecutionError> {
        ffmpeg::init().map_err(|e| engine_failure("failed to initialize libav", e))?;
        Ok(Self)
    }

    fn probe_blocking(path: &Path) -> Result<MediaInfo, ExecutionError> {
        let input = ffmpeg::format::input(&path)
            .map_err(|e| engine_failure(&format!("failed to open {}", path.display()), e))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| ExecutionError::EngineFailure("no video stream found".into()))?;
        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| engine_failure("failed to read video parameters", e))?;

        let duration = if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        MediaInfo::new(decoder.width(), decoder.height(), duration)
            .map_err(|e| ExecutionError::EngineFailure(e.to_string()))
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe(&self, source: &Path) -> Result<MediaInfo, ExecutionError> {
        let path: PathBuf = source.to_path_buf();
        let info = tokio::task::spawn_blocking(move || Self::probe_blocking(&path))
            .await
            .map_err(|e| ExecutionError::ResourceUnavailable(format!("probe task failed: {}", e)))??;
        debug!(source = %source.display(), width = info.width, height = info.height, "Probed media with libav");
        Ok(info)
    }
}

fn engine_failure(context: &str, err: ffmpeg::Error) -> ExecutionError {
    ExecutionError::EngineFailure(format!("{}: {}", context, err))
}
