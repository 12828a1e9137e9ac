//! Runs a compiled graph through the engine

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::errors::ExecutionError;
use crate::domain::model::*;
use crate::engine::progress::ProgressChannel;
use crate::engine::session::EngineSession;
use crate::ports::{StoragePort, TranscodeJob};

/// Input media for one execution
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMedia {
    pub path: PathBuf,
    /// Probe result, when available. Used for progress and trim clamping.
    pub info: Option<MediaInfo>,
}

impl SourceMedia {
    pub fn new(path: impl Into<PathBuf>, info: Option<MediaInfo>) -> Self {
        Self {
            path: path.into(),
            info,
        }
    }
}

/// Execution adapter: one engine invocation per call, staged output cleaned up on every path
pub struct Executor {
    session: Arc<EngineSession>,
    storage: Arc<dyn StoragePort>,
}

impl Executor {
    pub fn new(session: Arc<EngineSession>, storage: Arc<dyn StoragePort>) -> Self {
        Self { session, storage }
    }

    pub fn storage(&self) -> &Arc<dyn StoragePort> {
        &self.storage
    }

    /// Execute `graph` against `source`, reporting progress on `channel`.
    ///
    /// Reports `0.0` before the engine starts and `1.0` once the output has been read back.
    /// The terminal event is left to the caller.
    pub async fn execute(
        &self,
        graph: &CompiledGraph,
        source: &SourceMedia,
        options: &OutputOptions,
        channel: &ProgressChannel,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult, ExecutionError> {
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        channel.report(0.0);
        let output = self.storage.allocate(options.format.extension()).await?;
        let outcome = self
            .run(graph, source, options, &output, channel, cancel)
            .await;

        if let Err(e) = self.storage.delete(&output).await {
            warn!(handle = %output, error = %e, "Failed to clean up staged output");
        }

        let bytes = outcome?;
        channel.report(1.0);
        info!(
            source = %source.path.display(),
            bytes = bytes.len(),
            format = %options.format,
            "Execution finished"
        );
        Ok(ProcessingResult::new(bytes, options.mime_type()))
    }

    async fn run(
        &self,
        graph: &CompiledGraph,
        source: &SourceMedia,
        options: &OutputOptions,
        output: &MediaHandle,
        channel: &ProgressChannel,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ExecutionError> {
        let job = TranscodeJob::from_graph(
            graph,
            &source.path,
            self.storage.locate(output)?,
            options.clone(),
            source.info.map(|i| i.duration_seconds),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let transcode = self.session.run(&job, tx);
        tokio::pin!(transcode);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(source = %source.path.display(), "Execution cancelled");
                    break Err(ExecutionError::Cancelled);
                }
                result = &mut transcode => break result,
                Some(fraction) = rx.recv() => {
                    channel.report(fraction);
                }
            }
        };
        result?;

        while let Ok(fraction) = rx.try_recv() {
            channel.report(fraction);
        }

        let bytes = self.storage.read(output).await?;
        if bytes.is_empty() {
            return Err(ExecutionError::EngineFailure(
                "engine exited successfully but wrote no output".into(),
            ));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::adapters::fs_storage::FsStorageAdapter;
    use crate::compiler::compile;
    use crate::engine::progress::{ChannelSink, ProgressEvent};
    use crate::ports::{EngineError, TranscodePort};

    /// Writes fixed bytes after reporting a few fractions
    struct StubEngine;

    #[async_trait]
    impl TranscodePort for StubEngine {
        async fn transcode(
            &self,
            job: &TranscodeJob,
            progress: mpsc::UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            for fraction in [0.25, 0.5, 0.75] {
                let _ = progress.send(fraction);
            }
            tokio::fs::write(&job.output, b"encoded")
                .await
                .map_err(|e| EngineError::new(e.to_string()))
        }
    }

    /// Writes output without ever reporting progress
    struct SilentEngine;

    #[async_trait]
    impl TranscodePort for SilentEngine {
        async fn transcode(
            &self,
            job: &TranscodeJob,
            _progress: mpsc::UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            tokio::fs::write(&job.output, b"quiet")
                .await
                .map_err(|e| EngineError::new(e.to_string()))
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl TranscodePort for FailingEngine {
        async fn transcode(
            &self,
            _job: &TranscodeJob,
            _progress: mpsc::UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            Err(EngineError::new("Error initializing filter 'crop'"))
        }
    }

    struct StalledEngine;

    #[async_trait]
    impl TranscodePort for StalledEngine {
        async fn transcode(
            &self,
            _job: &TranscodeJob,
            _progress: mpsc::UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    /// Records every allocated and deleted handle
    struct TrackingStorage {
        inner: FsStorageAdapter,
        allocated: Mutex<Vec<MediaHandle>>,
        deleted: Mutex<Vec<MediaHandle>>,
    }

    impl TrackingStorage {
        fn leaked(&self) -> Vec<MediaHandle> {
            let deleted = self.deleted.lock().unwrap();
            self.allocated
                .lock()
                .unwrap()
                .iter()
                .filter(|h| !deleted.contains(h))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl StoragePort for TrackingStorage {
        async fn save(&self, bytes: &[u8], ext: &str) -> Result<MediaHandle, ExecutionError> {
            let handle = self.inner.save(bytes, ext).await?;
            self.allocated.lock().unwrap().push(handle.clone());
            Ok(handle)
        }

        async fn read(&self, handle: &MediaHandle) -> Result<Vec<u8>, ExecutionError> {
            self.inner.read(handle).await
        }

        async fn delete(&self, handle: &MediaHandle) -> Result<(), ExecutionError> {
            self.deleted.lock().unwrap().push(handle.clone());
            self.inner.delete(handle).await
        }

        async fn allocate(&self, ext: &str) -> Result<MediaHandle, ExecutionError> {
            let handle = self.inner.allocate(ext).await?;
            self.allocated.lock().unwrap().push(handle.clone());
            Ok(handle)
        }

        fn locate(&self, handle: &MediaHandle) -> Result<PathBuf, ExecutionError> {
            self.inner.locate(handle)
        }
    }

    fn setup(engine: Arc<dyn TranscodePort>) -> (TempDir, Arc<TrackingStorage>, Executor) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(TrackingStorage {
            inner: FsStorageAdapter::new(dir.path()).unwrap(),
            allocated: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        });
        let session = Arc::new(EngineSession::new(engine, 1));
        let executor = Executor::new(session, storage.clone());
        (dir, storage, executor)
    }

    fn graph() -> CompiledGraph {
        let ops = OperationList::from_operations(vec![Operation::resize(1280, 720)]).unwrap();
        compile(&ops, None).unwrap()
    }

    fn progress_of(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<f64> {
        let mut fractions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressEvent::Progress(f) = event {
                fractions.push(f);
            }
        }
        fractions
    }

    #[tokio::test]
    async fn test_successful_execution_reports_monotonic_progress() {
        let (_dir, storage, executor) = setup(Arc::new(StubEngine));
        let (sink, mut rx) = ChannelSink::new();
        let channel = ProgressChannel::new(Arc::new(sink));

        let result = executor
            .execute(
                &graph(),
                &SourceMedia::new("input.mp4", None),
                &OutputOptions::default(),
                &channel,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.bytes, b"encoded");
        assert_eq!(result.mime_type, "video/mp4");
        assert_eq!(progress_of(&mut rx), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(storage.leaked().is_empty());
    }

    #[tokio::test]
    async fn test_engine_without_progress_reports_only_bounds() {
        let (_dir, storage, executor) = setup(Arc::new(SilentEngine));
        let (sink, mut rx) = ChannelSink::new();
        let channel = ProgressChannel::new(Arc::new(sink));

        let result = executor
            .execute(
                &graph(),
                &SourceMedia::new("input.mp4", None),
                &OutputOptions::default(),
                &channel,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.bytes, b"quiet");
        assert_eq!(progress_of(&mut rx), vec![0.0, 1.0]);
        assert!(storage.leaked().is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_is_verbatim_and_cleans_up() {
        let (_dir, storage, executor) = setup(Arc::new(FailingEngine));
        let (sink, mut rx) = ChannelSink::new();
        let channel = ProgressChannel::new(Arc::new(sink));

        let err = executor
            .execute(
                &graph(),
                &SourceMedia::new("input.mp4", None),
                &OutputOptions::default(),
                &channel,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutionError::EngineFailure("Error initializing filter 'crop'".into())
        );
        assert_eq!(storage.allocated.lock().unwrap().len(), 1);
        assert!(storage.leaked().is_empty());
        assert_eq!(progress_of(&mut rx), vec![0.0]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_engine_and_cleans_up() {
        let (_dir, storage, executor) = setup(Arc::new(StalledEngine));
        let (sink, _rx) = ChannelSink::new();
        let channel = ProgressChannel::new(Arc::new(sink));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = executor
            .execute(
                &graph(),
                &SourceMedia::new("input.mp4", None),
                &OutputOptions::default(),
                &channel,
                &cancel,
            )
            .await
            .unwrap_err();

        assert_eq!(err, ExecutionError::Cancelled);
        assert!(storage.leaked().is_empty());
    }

    #[tokio::test]
    async fn test_already_cancelled_never_touches_storage() {
        let (_dir, storage, executor) = setup(Arc::new(StubEngine));
        let (sink, _rx) = ChannelSink::new();
        let channel = ProgressChannel::new(Arc::new(sink));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = executor
            .execute(
                &graph(),
                &SourceMedia::new("input.mp4", None),
                &OutputOptions::default(),
                &channel,
                &cancel,
            )
            .await
            .unwrap_err();

        assert_eq!(err, ExecutionError::Cancelled);
        assert!(storage.allocated.lock().unwrap().is_empty());
    }
}
