// Process interactor - Orchestrates the compile-and-execute use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::editor_session::EditorSession;
use crate::compiler::GraphCompiler;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::{Executor, ProgressChannel, SourceMedia};
use crate::ports::*;

/// Source file plus export options for one processing request
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub input: PathBuf,
    pub options: OutputOptions,
}

impl ProcessRequest {
    pub fn new(input: impl Into<PathBuf>, options: OutputOptions) -> Self {
        Self {
            input: input.into(),
            options,
        }
    }
}

/// Interactor for processing a session's operation list
pub struct ProcessInteractor {
    compiler: GraphCompiler,
    probe_port: Arc<dyn ProbePort>,
    executor: Arc<Executor>,
}

impl ProcessInteractor {
    /// Create new process interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>, executor: Arc<Executor>) -> Self {
        Self {
            compiler: GraphCompiler::new(),
            probe_port,
            executor,
        }
    }

    /// Process the session's current operations against a file.
    ///
    /// `sink` receives progress and exactly one terminal event, whatever the outcome.
    pub async fn process(
        &self,
        session: &EditorSession,
        request: ProcessRequest,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ProcessingResult, ProcessingError> {
        let channel = ProgressChannel::new(sink);
        let outcome = self
            .run(session, &request.input, &request.options, &channel, &cancel)
            .await;
        channel.finish(&outcome);
        outcome
    }

    /// Process in-memory media: staged through storage for the engine and removed afterwards
    pub async fn process_bytes(
        &self,
        session: &EditorSession,
        media: &[u8],
        extension: &str,
        options: OutputOptions,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ProcessingResult, ProcessingError> {
        let channel = ProgressChannel::new(sink);
        let storage = self.executor.storage();

        let outcome = match storage.save(media, extension).await {
            Ok(handle) => {
                let result = match storage.locate(&handle) {
                    Ok(path) => self.run(session, &path, &options, &channel, &cancel).await,
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = storage.delete(&handle).await {
                    warn!(%handle, error = %e, "Failed to remove staged input");
                }
                result
            }
            Err(e) => Err(e.into()),
        };

        channel.finish(&outcome);
        outcome
    }

    async fn run(
        &self,
        session: &EditorSession,
        input: &Path,
        options: &OutputOptions,
        channel: &ProgressChannel,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult, ProcessingError> {
        let _guard = session.begin_processing()?;
        options.validate()?;

        let operations = session.snapshot();
        if operations.is_empty() {
            return Err(CompileError::EmptyOperationList.into());
        }
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled.into());
        }

        let info = match self.probe_port.probe(input).await {
            Ok(info) => Some(info),
            Err(e) => {
                // Only crops depend on dimensions; the compiler reports those
                warn!(input = %input.display(), error = %e, "Probe failed");
                None
            }
        };

        let graph = self.compiler.compile(&operations, info.as_ref())?;
        info!(
            input = %input.display(),
            stages = graph.stage_count(),
            format = %options.format,
            "Processing"
        );

        let source = SourceMedia::new(input, info);
        let result = self
            .executor
            .execute(&graph, &source, options, channel, cancel)
            .await?;
        Ok(result)
    }
}
