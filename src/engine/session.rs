//! Owned handle to the shared media engine

use std::sync::Arc;

use tokio::sync::{mpsc::UnboundedSender, Semaphore};
use tracing::debug;

use crate::domain::errors::ExecutionError;
use crate::ports::{TranscodeJob, TranscodePort};

/// The engine instance plus the slots that serialize access to it.
///
/// Created once by the application container and passed by reference to every executor.
pub struct EngineSession {
    engine: Arc<dyn TranscodePort>,
    slots: Semaphore,
    capacity: usize,
}

impl EngineSession {
    /// `slots` concurrent invocations, at least one
    pub fn new(engine: Arc<dyn TranscodePort>, slots: usize) -> Self {
        let capacity = slots.max(1);
        Self {
            engine,
            slots: Semaphore::new(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Stop handing out slots; waiting and future invocations fail
    pub fn close(&self) {
        self.slots.close();
    }

    /// Wait for a free slot and run one engine invocation in it
    pub async fn run(
        &self,
        job: &TranscodeJob,
        progress: UnboundedSender<f64>,
    ) -> Result<(), ExecutionError> {
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| ExecutionError::ResourceUnavailable("engine session closed".into()))?;
        debug!(
            input = %job.input.display(),
            output = %job.output.display(),
            free_slots = self.slots.available_permits(),
            "Engine slot acquired"
        );
        self.engine.transcode(job, progress).await?;
        Ok(())
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("capacity", &self.capacity)
            .field("available", &self.slots.available_permits())
            .finish()
    }
}
