// Batch interactor - Applies one operation list to many sources

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app::editor_session::EditorSession;
use crate::app::process_interactor::{ProcessInteractor, ProcessRequest};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::ProgressChannel;
use crate::ports::ProgressSink;

/// One source and where its result goes
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl BatchJob {
    /// Output named after the input's stem, inside `out_dir`
    pub fn into_dir(input: impl Into<PathBuf>, out_dir: &Path, format: OutputFormat) -> Self {
        let input = input.into();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let output = out_dir.join(format!("{}.{}", stem, format.extension()));
        Self { input, output }
    }

    /// Jobs for every input into `out_dir`. Inputs sharing a stem get `-2`, `-3`, ...
    /// suffixes in submission order so no output is written twice.
    pub fn into_dir_all<I, P>(inputs: I, out_dir: &Path, format: OutputFormat) -> Vec<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut taken = HashSet::new();
        inputs
            .into_iter()
            .map(|input| {
                let mut job = Self::into_dir(input, out_dir, format);
                if !taken.insert(job.output.clone()) {
                    let stem = job
                        .output
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let mut n = 2;
                    loop {
                        let candidate =
                            out_dir.join(format!("{}-{}.{}", stem, n, format.extension()));
                        if taken.insert(candidate.clone()) {
                            warn!(
                                input = %job.input.display(),
                                output = %candidate.display(),
                                "Output name already used, renaming"
                            );
                            job.output = candidate;
                            break;
                        }
                        n += 1;
                    }
                }
                job
            })
            .collect()
    }
}

/// Outcome for one source: bytes written, or why it failed
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: Result<u64, ProcessingError>,
}

/// Per-source results in submission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Interactor for batch processing
pub struct BatchInteractor {
    process: Arc<ProcessInteractor>,
}

impl BatchInteractor {
    pub fn new(process: Arc<ProcessInteractor>) -> Self {
        Self { process }
    }

    /// Run every job concurrently; the engine session bounds how many encode at once.
    ///
    /// `overall` receives the mean progress across jobs. Each job gets its own session and
    /// staging scope, so one failure never affects the others.
    pub async fn run(
        &self,
        operations: &OperationList,
        jobs: Vec<BatchJob>,
        options: &OutputOptions,
        overall: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let tracker = Arc::new(BatchProgress::new(jobs.len(), overall));
        let mut slots: Vec<Option<BatchItem>> = vec![None; jobs.len()];
        let paths: Vec<(PathBuf, PathBuf)> = jobs
            .iter()
            .map(|j| (j.input.clone(), j.output.clone()))
            .collect();

        info!(jobs = jobs.len(), operations = operations.len(), "Starting batch");

        let mut set = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let process = Arc::clone(&self.process);
            let session = EditorSession::with_operations(operations.clone());
            let sink: Arc<dyn ProgressSink> = Arc::new(JobSink {
                index,
                tracker: Arc::clone(&tracker),
            });
            let options = options.clone();
            let cancel = cancel.child_token();

            set.spawn(async move {
                let request = ProcessRequest::new(job.input.clone(), options);
                let outcome = match process.process(&session, request, sink, cancel).await {
                    Ok(result) => write_output(&job.output, &result).await,
                    Err(e) => Err(e),
                };
                let item = BatchItem {
                    input: job.input,
                    output: job.output,
                    outcome,
                };
                (index, item)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, item)) => slots[index] = Some(item),
                Err(e) => error!(error = %e, "Batch task aborted"),
            }
        }

        let items: Vec<BatchItem> = slots
            .into_iter()
            .zip(paths)
            .map(|(slot, (input, output))| {
                slot.unwrap_or_else(|| BatchItem {
                    input,
                    output,
                    outcome: Err(ExecutionError::ResourceUnavailable(
                        "batch task aborted".into(),
                    )
                    .into()),
                })
            })
            .collect();

        let report = BatchReport { items };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch finished"
        );
        report
    }
}

async fn write_output(path: &Path, result: &ProcessingResult) -> Result<u64, ProcessingError> {
    let unavailable =
        |e: std::io::Error| ExecutionError::ResourceUnavailable(format!("{}: {}", path.display(), e));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
    }
    tokio::fs::write(path, &result.bytes)
        .await
        .map_err(unavailable)?;
    Ok(result.len() as u64)
}

/// Mean of per-job fractions, forwarded to the overall channel
struct BatchProgress {
    fractions: Mutex<Vec<f64>>,
    channel: ProgressChannel,
}

impl BatchProgress {
    fn new(jobs: usize, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            fractions: Mutex::new(vec![0.0; jobs]),
            channel: ProgressChannel::new(sink),
        }
    }

    fn update(&self, index: usize, fraction: f64) {
        let mean = {
            let mut fractions = self
                .fractions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let Some(slot) = fractions.get_mut(index) else {
                return;
            };
            *slot = slot.max(fraction);
            fractions.iter().sum::<f64>() / fractions.len() as f64
        };
        self.channel.report(mean);
    }
}

struct JobSink {
    index: usize,
    tracker: Arc<BatchProgress>,
}

impl ProgressSink for JobSink {
    fn on_progress(&self, fraction: f64) {
        self.tracker.update(self.index, fraction);
    }

    fn on_complete(&self, result: &ProcessingResult) {
        info!(job = self.index, bytes = result.len(), "Batch job complete");
        self.tracker.update(self.index, 1.0);
    }

    fn on_error(&self, err: &ProcessingError) {
        warn!(job = self.index, error = %err.details(), "Batch job failed");
        self.tracker.update(self.index, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_output_naming() {
        let job = BatchJob::into_dir("/videos/holiday.final.mov", Path::new("/out"), OutputFormat::Webm);
        assert_eq!(job.output, PathBuf::from("/out/holiday.final.webm"));
    }

    #[test]
    fn test_same_stem_in_different_dirs_gets_distinct_outputs() {
        let jobs = BatchJob::into_dir_all(
            ["a/clip.mov", "b/clip.mov", "clip-2.mp4", "c/clip.mkv"],
            Path::new("/out"),
            OutputFormat::Mp4,
        );
        let outputs: Vec<PathBuf> = jobs.iter().map(|j| j.output.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("/out/clip.mp4"),
                PathBuf::from("/out/clip-2.mp4"),
                PathBuf::from("/out/clip-2-2.mp4"),
                PathBuf::from("/out/clip-3.mp4"),
            ]
        );
        assert_eq!(jobs[1].input, PathBuf::from("b/clip.mov"));
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            items: vec![
                BatchItem {
                    input: "a.mp4".into(),
                    output: "out/a.mp4".into(),
                    outcome: Ok(10),
                },
                BatchItem {
                    input: "b.mp4".into(),
                    output: "out/b.mp4".into(),
                    outcome: Err(ExecutionError::Cancelled.into()),
                },
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }
}
