// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Read frame dimensions and duration of `source`
    async fn probe(&self, source: &Path) -> Result<MediaInfo, ExecutionError>;
}

/// Everything the engine needs for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub trim: Option<TrimDirective>,
    pub filter_graph: Option<String>,
    pub options: OutputOptions,
    /// Duration of the produced output, used to turn engine timestamps into fractions
    pub expected_duration: Option<f64>,
}

impl TranscodeJob {
    /// Build a job from a compiled graph
    pub fn from_graph(
        graph: &CompiledGraph,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: OutputOptions,
        source_duration: Option<f64>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            trim: graph.trim().copied(),
            filter_graph: graph.filter_graph(),
            options,
            expected_duration: graph.output_duration(source_duration),
        }
    }
}

/// Raw engine diagnostic, never rewritten
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{diagnostic}")]
pub struct EngineError {
    pub diagnostic: String,
}

impl EngineError {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<EngineError> for ExecutionError {
    fn from(err: EngineError) -> Self {
        ExecutionError::EngineFailure(err.diagnostic)
    }
}

/// Port for the media engine
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run one engine invocation.
    ///
    /// Progress fractions in `[0, 1]` go to `progress` when the engine reports them.
    /// Dropping the returned future must stop the engine.
    async fn transcode(
        &self,
        job: &TranscodeJob,
        progress: UnboundedSender<f64>,
    ) -> Result<(), EngineError>;
}

/// Port for staged media artifacts
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Store `bytes` under a fresh handle
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<MediaHandle, ExecutionError>;

    /// Read the full artifact
    async fn read(&self, handle: &MediaHandle) -> Result<Vec<u8>, ExecutionError>;

    /// Delete the artifact; deleting a missing artifact is not an error
    async fn delete(&self, handle: &MediaHandle) -> Result<(), ExecutionError>;

    /// Reserve a fresh handle the engine can write to
    async fn allocate(&self, extension: &str) -> Result<MediaHandle, ExecutionError>;

    /// Filesystem location of `handle`
    fn locate(&self, handle: &MediaHandle) -> Result<PathBuf, ExecutionError>;
}

/// Observer of one processing request
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, fraction: f64);

    fn on_complete(&self, result: &ProcessingResult);

    fn on_error(&self, error: &ProcessingError);
}
