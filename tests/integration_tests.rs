//! End-to-end tests of the process and batch pipelines with stand-in engine and probe

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use videoforge::adapters::{AppConfig, FsStorageAdapter};
use videoforge::app::{AppContainer, BatchJob, DefaultAppContainer, EditorSession, ProcessRequest};
use videoforge::domain::model::{FilterKind, OutputFormat};
use videoforge::engine::{ChannelSink, LoggingSink, ProgressEvent};
use videoforge::ports::{EngineError, ProbePort, TranscodeJob, TranscodePort};
use videoforge::*;

/// Test utilities for the processing pipeline
mod test_utils {
    use super::*;

    /// Engine that records each job and writes its filter graph as the output
    #[derive(Default)]
    pub struct RecordingEngine {
        pub jobs: Mutex<Vec<TranscodeJob>>,
    }

    #[async_trait]
    impl TranscodePort for RecordingEngine {
        async fn transcode(
            &self,
            job: &TranscodeJob,
            progress: UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            self.jobs.lock().unwrap().push(job.clone());
            for fraction in [0.2, 0.6, 0.4, 0.9] {
                let _ = progress.send(fraction);
            }
            let body = job.filter_graph.clone().unwrap_or_else(|| "copy".into());
            tokio::fs::write(&job.output, body)
                .await
                .map_err(|e| EngineError::new(e.to_string()))
        }
    }

    pub struct FailingEngine(pub &'static str);

    #[async_trait]
    impl TranscodePort for FailingEngine {
        async fn transcode(
            &self,
            _job: &TranscodeJob,
            _progress: UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            Err(EngineError::new(self.0))
        }
    }

    pub struct StalledEngine;

    #[async_trait]
    impl TranscodePort for StalledEngine {
        async fn transcode(
            &self,
            _job: &TranscodeJob,
            progress: UnboundedSender<f64>,
        ) -> Result<(), EngineError> {
            let _ = progress.send(0.1);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    pub struct FixedProbe(pub Option<MediaInfo>);

    #[async_trait]
    impl ProbePort for FixedProbe {
        async fn probe(&self, source: &Path) -> Result<MediaInfo, ExecutionError> {
            self.0.ok_or_else(|| {
                ExecutionError::EngineFailure(format!("{}: Invalid data found", source.display()))
            })
        }
    }

    pub struct Harness {
        pub container: DefaultAppContainer,
        pub storage_root: PathBuf,
        _dir: TempDir,
    }

    pub fn harness(engine: Arc<dyn TranscodePort>, probe: Option<MediaInfo>) -> Harness {
        let dir = TempDir::new().unwrap();
        let storage_root = dir.path().join("storage");
        let storage = Arc::new(FsStorageAdapter::new(&storage_root).unwrap());
        let container = DefaultAppContainer::with_ports(
            AppConfig::default(),
            engine,
            Arc::new(FixedProbe(probe)),
            storage,
        );
        Harness {
            container,
            storage_root,
            _dir: dir,
        }
    }

    pub fn full_hd() -> MediaInfo {
        MediaInfo::new(1920, 1080, 10.0).unwrap()
    }

    pub fn drain(rx: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Progress values must rise strictly and exactly one terminal event must come last
    pub fn assert_well_formed(events: &[ProgressEvent]) {
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1, "events: {:?}", events);
        assert!(events.last().unwrap().is_terminal());

        let fractions: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress(f) => Some(*f),
                _ => None,
            })
            .collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]), "{:?}", fractions);
        assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    pub fn staged_files(root: &Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }
}

use test_utils::*;

#[tokio::test]
async fn test_resize_and_grayscale_end_to_end() {
    let engine = Arc::new(RecordingEngine::default());
    let h = harness(engine.clone(), Some(full_hd()));

    let mut session = EditorSession::new();
    session.push(Operation::resize(1280, 720)).unwrap();
    session
        .push(Operation::filters(
            FilterSet::new().with(FilterKind::Grayscale, 100),
        ))
        .unwrap();

    let (sink, mut rx) = ChannelSink::new();
    let result = h
        .container
        .process_interactor()
        .process(
            &session,
            ProcessRequest::new("clip.mov", OutputOptions::default()),
            Arc::new(sink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let graph = "scale=1280:720,colorchannelmixer=.3:.4:.3:0:.3:.4:.3:0:.3:.4:.3";
    assert_eq!(result.mime_type, "video/mp4");
    assert_eq!(result.bytes, graph.as_bytes());

    let jobs = engine.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].filter_graph.as_deref(), Some(graph));
    assert_eq!(jobs[0].input, PathBuf::from("clip.mov"));
    assert!(jobs[0].trim.is_none());

    let events = drain(&mut rx);
    assert_well_formed(&events);
    assert!(matches!(events.last(), Some(ProgressEvent::Complete(r)) if r == &result));
    assert!(events.contains(&ProgressEvent::Progress(1.0)));

    assert_eq!(staged_files(&h.storage_root), 0);
}

#[tokio::test]
async fn test_trim_only_passes_seek_without_filters() {
    let engine = Arc::new(RecordingEngine::default());
    let h = harness(engine.clone(), Some(full_hd()));
    let session = EditorSession::with_operations(
        OperationList::from_operations(vec![Operation::trim(2.0, 5.0)]).unwrap(),
    );

    h.container
        .process_interactor()
        .process(
            &session,
            ProcessRequest::new("clip.mov", OutputOptions::default()),
            Arc::new(LoggingSink::new("trim")),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let jobs = engine.jobs.lock().unwrap();
    assert_eq!(jobs[0].filter_graph, None);
    assert_eq!(jobs[0].trim, Some(TrimDirective::new(2.0, 5.0)));
    assert_eq!(jobs[0].expected_duration, Some(3.0));
}

#[tokio::test]
async fn test_engine_failure_reaches_sink_verbatim() {
    let diagnostic = "[Parsed_crop_0 @ 0x55d] Invalid too big or non positive size for width '4000'";
    let h = harness(Arc::new(FailingEngine(diagnostic)), Some(full_hd()));
    let session = EditorSession::with_operations(
        OperationList::from_operations(vec![Operation::rotate(90.0)]).unwrap(),
    );

    let (sink, mut rx) = ChannelSink::new();
    let err = h
        .container
        .process_interactor()
        .process(
            &session,
            ProcessRequest::new("clip.mov", OutputOptions::default()),
            Arc::new(sink),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ProcessingError::Execution(ExecutionError::EngineFailure(diagnostic.to_string()))
    );
    assert!(err.details().contains(diagnostic));

    let events = drain(&mut rx);
    assert_well_formed(&events);
    assert_eq!(events.last(), Some(&ProgressEvent::Error(err)));
    assert_eq!(staged_files(&h.storage_root), 0);
}

#[tokio::test]
async fn test_cancellation_stops_engine_and_cleans_up() {
    let h = harness(Arc::new(StalledEngine), Some(full_hd()));
    let session = EditorSession::with_operations(
        OperationList::from_operations(vec![Operation::resize(640, 360)]).unwrap(),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let (sink, mut rx) = ChannelSink::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        h.container.process_interactor().process(
            &session,
            ProcessRequest::new("clip.mov", OutputOptions::default()),
            Arc::new(sink),
            cancel,
        ),
    )
    .await
    .expect("cancellation did not stop processing");

    assert_eq!(
        outcome.unwrap_err(),
        ProcessingError::Execution(ExecutionError::Cancelled)
    );
    let events = drain(&mut rx);
    assert_well_formed(&events);
    assert_eq!(staged_files(&h.storage_root), 0);
    assert!(!session.is_processing());
}

#[tokio::test]
async fn test_busy_session_is_rejected() {
    let engine = Arc::new(RecordingEngine::default());
    let h = harness(engine.clone(), Some(full_hd()));
    let session = EditorSession::with_operations(
        OperationList::from_operations(vec![Operation::resize(640, 360)]).unwrap(),
    );
    let _guard = session.begin_processing().unwrap();

    let (sink, mut rx) = ChannelSink::new();
    let err = h
        .container
        .process_interactor()
        .process(
            &session,
            ProcessRequest::new("clip.mov", OutputOptions::default()),
            Arc::new(sink),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProcessingError::Execution(ExecutionError::ResourceUnavailable(_))
    ));
    assert_well_formed(&drain(&mut rx));
    assert!(engine.jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_session_reports_compile_error() {
    let h = harness(Arc::new(RecordingEngine::default()), Some(full_hd()));
    let (sink, mut rx) = ChannelSink::new();

    let err = h
        .container
        .process_interactor()
        .process(
            &EditorSession::new(),
            ProcessRequest::new("clip.mov", OutputOptions::default()),
            Arc::new(sink),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ProcessingError::Compile(CompileError::EmptyOperationList));
    assert_eq!(drain(&mut rx), vec![ProgressEvent::Error(err)]);
}

#[tokio::test]
async fn test_crop_without_probe_is_unresolvable() {
    let h = harness(Arc::new(RecordingEngine::default()), None);
    let session = EditorSession::with_operations(
        OperationList::from_operations(vec![Operation::crop(0.0, 0.0, 50.0, 50.0)]).unwrap(),
    );

    let err = h
        .container
        .process_interactor()
        .process(
            &session,
            ProcessRequest::new("broken.mov", OutputOptions::default()),
            Arc::new(LoggingSink::new("crop")),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ProcessingError::Compile(CompileError::UnresolvableCrop));
}

#[tokio::test]
async fn test_process_bytes_removes_staged_input() {
    let engine = Arc::new(RecordingEngine::default());
    let h = harness(engine.clone(), Some(full_hd()));
    let session = EditorSession::with_operations(
        OperationList::from_operations(vec![Operation::crop(25.0, 25.0, 50.0, 50.0)]).unwrap(),
    );

    let result = h
        .container
        .process_interactor()
        .process_bytes(
            &session,
            b"raw upload",
            "webm",
            OutputOptions::for_format(OutputFormat::Webm),
            Arc::new(LoggingSink::new("upload")),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.mime_type, "video/webm");
    assert_eq!(result.bytes, b"crop=960:540:480:270");
    let jobs = engine.jobs.lock().unwrap();
    assert!(jobs[0].input.starts_with(&h.storage_root));
    assert_eq!(staged_files(&h.storage_root), 0);
}

#[tokio::test]
async fn test_batch_writes_every_output() {
    let engine = Arc::new(RecordingEngine::default());
    let h = harness(engine.clone(), Some(full_hd()));
    let out_dir = TempDir::new().unwrap();
    let operations = OperationList::from_operations(vec![
        Operation::trim(0.0, 4.0),
        Operation::resize(1080, 1080),
    ])
    .unwrap();

    let jobs = vec![
        BatchJob::into_dir("a.mov", out_dir.path(), OutputFormat::Mp4),
        BatchJob::into_dir("b.mov", out_dir.path(), OutputFormat::Mp4),
    ];
    let (sink, mut rx) = ChannelSink::new();
    let report = h
        .container
        .batch_interactor()
        .run(
            &operations,
            jobs,
            &OutputOptions::default(),
            Arc::new(sink),
            &CancellationToken::new(),
        )
        .await;

    assert!(report.is_success(), "{:?}", report);
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.items[0].output, out_dir.path().join("a.mp4"));
    assert_eq!(report.items[1].output, out_dir.path().join("b.mp4"));
    for item in &report.items {
        assert_eq!(std::fs::read(&item.output).unwrap(), b"scale=1080:1080");
    }
    assert_eq!(engine.jobs.lock().unwrap().len(), 2);

    let mut fractions = Vec::new();
    for event in drain(&mut rx) {
        match event {
            ProgressEvent::Progress(f) => fractions.push(f),
            other => panic!("batch progress never finishes the overall sink: {:?}", other),
        }
    }
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(fractions.windows(2).all(|w| w[0] < w[1]), "{:?}", fractions);
}
