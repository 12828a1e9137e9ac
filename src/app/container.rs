use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

#[cfg(not(feature = "libav"))]
use crate::adapters::FfprobeAdapter;
#[cfg(feature = "libav")]
use crate::adapters::ProbeLibavAdapter;
use crate::adapters::{AppConfig, FfmpegCliAdapter, FsStorageAdapter};
use crate::app::{BatchInteractor, ProcessInteractor};
use crate::compiler::GraphCompiler;
use crate::engine::{EngineSession, Executor};
use crate::error::VideoForgeResult;
use crate::ports::{ProbePort, StoragePort, TranscodePort};

/// Staged files older than this belong to runs that never cleaned up
const STALE_ARTIFACT_AGE: Duration = Duration::from_secs(24 * 60 * 60);

pub trait AppContainer: Send + Sync {
    fn process_interactor(&self) -> Arc<ProcessInteractor>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
    fn probe_port(&self) -> Arc<dyn ProbePort>;
    fn compiler(&self) -> GraphCompiler;
}

pub struct DefaultAppContainer {
    config: AppConfig,
    engine_session: Arc<EngineSession>,
    probe_port: Arc<dyn ProbePort>,
    process_interactor: Arc<ProcessInteractor>,
    batch_interactor: Arc<BatchInteractor>,
}

impl DefaultAppContainer {
    /// Wire the production adapters from `config`
    pub fn new(config: AppConfig) -> VideoForgeResult<Self> {
        let engine = Arc::new(FfmpegCliAdapter::new(
            &config.ffmpeg_path,
            Some(config.threads),
        ));
        let storage = Arc::new(FsStorageAdapter::new(&config.storage_dir)?);
        match storage.purge_stale(STALE_ARTIFACT_AGE) {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Purged stale artifacts"),
            Err(e) => warn!(error = %e, "Failed to purge stale artifacts"),
        }

        #[cfg(feature = "libav")]
        let probe_port: Arc<dyn ProbePort> = Arc::new(ProbeLibavAdapter::new()?);
        #[cfg(not(feature = "libav"))]
        let probe_port: Arc<dyn ProbePort> = Arc::new(FfprobeAdapter::new(&config.ffprobe_path));

        Ok(Self::with_ports(config, engine, probe_port, storage))
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        config: AppConfig,
        engine: Arc<dyn TranscodePort>,
        probe_port: Arc<dyn ProbePort>,
        storage: Arc<dyn StoragePort>,
    ) -> Self {
        let engine_session = Arc::new(EngineSession::new(engine, config.engine_slots));
        let executor = Arc::new(Executor::new(Arc::clone(&engine_session), storage));

        let process_interactor = Arc::new(ProcessInteractor::new(
            Arc::clone(&probe_port),
            executor,
        ));
        let batch_interactor = Arc::new(BatchInteractor::new(Arc::clone(&process_interactor)));

        Self {
            config,
            engine_session,
            probe_port,
            process_interactor,
            batch_interactor,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn engine_session(&self) -> &Arc<EngineSession> {
        &self.engine_session
    }
}

impl AppContainer for DefaultAppContainer {
    fn process_interactor(&self) -> Arc<ProcessInteractor> {
        Arc::clone(&self.process_interactor)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }

    fn probe_port(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe_port)
    }

    fn compiler(&self) -> GraphCompiler {
        GraphCompiler::new()
    }
}
