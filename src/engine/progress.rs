//! Result/progress channel for processing requests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::errors::ProcessingError;
use crate::domain::model::ProcessingResult;
use crate::ports::ProgressSink;

/// Wraps a [`ProgressSink`] and enforces the delivery contract:
/// progress in `[0, 1]`, never decreasing, nothing after the terminal call, and exactly one
/// terminal call.
pub struct ProgressChannel {
    sink: Arc<dyn ProgressSink>,
    state: Mutex<ChannelState>,
}

#[derive(Debug, Default)]
struct ChannelState {
    last: Option<f64>,
    finished: bool,
}

impl ProgressChannel {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(ChannelState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forward a progress fraction. Returns whether the sink saw it.
    pub fn report(&self, fraction: f64) -> bool {
        if !fraction.is_finite() {
            return false;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        let mut state = self.state();
        if state.finished {
            return false;
        }
        if matches!(state.last, Some(last) if fraction <= last) {
            return false;
        }
        state.last = Some(fraction);
        // Sink is called under the lock so a concurrent finish cannot overtake it
        self.sink.on_progress(fraction);
        true
    }

    /// Deliver the terminal event. Only the first call reaches the sink.
    pub fn finish(&self, outcome: &Result<ProcessingResult, ProcessingError>) -> bool {
        let mut state = self.state();
        if state.finished {
            warn!("Dropping terminal event for an already finished request");
            return false;
        }
        state.finished = true;
        match outcome {
            Ok(result) => self.sink.on_complete(result),
            Err(err) => self.sink.on_error(err),
        }
        true
    }

    pub fn is_finished(&self) -> bool {
        self.state().finished
    }

    /// Last fraction forwarded to the sink
    pub fn last_progress(&self) -> Option<f64> {
        self.state().last
    }
}

/// Events produced by [`ChannelSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress(f64),
    Complete(ProcessingResult),
    Error(ProcessingError),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Progress(_))
    }
}

/// Sink that forwards every event into a tokio channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ProgressEvent) {
        // Receiver gone means nobody is listening anymore
        if self.tx.send(event).is_err() {
            debug!("Progress receiver dropped");
        }
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&self, fraction: f64) {
        self.send(ProgressEvent::Progress(fraction));
    }

    fn on_complete(&self, result: &ProcessingResult) {
        self.send(ProgressEvent::Complete(result.clone()));
    }

    fn on_error(&self, error: &ProcessingError) {
        self.send(ProgressEvent::Error(error.clone()));
    }
}

/// Sink that logs progress in 10% steps
pub struct LoggingSink {
    label: String,
    last_decile: AtomicU32,
}

impl LoggingSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_decile: AtomicU32::new(0),
        }
    }
}

impl ProgressSink for LoggingSink {
    fn on_progress(&self, fraction: f64) {
        let decile = (fraction * 10.0).floor() as u32;
        let previous = self.last_decile.fetch_max(decile, Ordering::Relaxed);
        if decile > previous {
            info!(job = %self.label, percent = decile * 10, "Processing");
        }
    }

    fn on_complete(&self, result: &ProcessingResult) {
        info!(
            job = %self.label,
            bytes = result.len(),
            mime_type = %result.mime_type,
            "Processing complete"
        );
    }

    fn on_error(&self, err: &ProcessingError) {
        error!(job = %self.label, error = %err.details(), "Processing failed");
    }
}
