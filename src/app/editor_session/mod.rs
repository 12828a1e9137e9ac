// Editor session - The user's operation list plus the one-job-at-a-time guard

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::{ExecutionError, ValidationError};
use crate::domain::model::*;
use crate::domain::presets::Preset;

/// One editing session. Owns its operation list; at most one processing job runs per
/// session at any time.
#[derive(Debug, Default)]
pub struct EditorSession {
    operations: OperationList,
    busy: Arc<AtomicBool>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operations(operations: OperationList) -> Self {
        Self {
            operations,
            busy: Arc::default(),
        }
    }

    pub fn operations(&self) -> &OperationList {
        &self.operations
    }

    /// Copy of the current list, taken when a job starts
    pub fn snapshot(&self) -> OperationList {
        self.operations.clone()
    }

    pub fn push(&mut self, operation: Operation) -> Result<(), ValidationError> {
        self.operations.push(operation)
    }

    pub fn remove(&mut self, index: usize) -> Option<Operation> {
        self.operations.remove(index)
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn replace(&mut self, operations: OperationList) {
        self.operations = operations;
    }

    /// Append the operations of a preset
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<(), ValidationError> {
        let operations = preset.operations()?;
        self.operations.extend_from(&operations);
        debug!(preset = preset.name, total = self.operations.len(), "Applied preset");
        Ok(())
    }

    pub fn is_processing(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Mark the session busy until the returned guard is dropped
    pub fn begin_processing(&self) -> Result<ProcessingGuard, ExecutionError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                ExecutionError::ResourceUnavailable(
                    "a processing job is already running in this session".into(),
                )
            })?;
        Ok(ProcessingGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

/// Releases the session when dropped
#[derive(Debug)]
pub struct ProcessingGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
