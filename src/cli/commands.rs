//! Command implementations for the CLI

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::FfmpegCliAdapter;
use crate::app::{
    load_operations, AppContainer, BatchJob, DefaultAppContainer, EditorSession, ProcessRequest,
    Project,
};
use crate::cli::args::{
    BatchArgs, CompileArgs, PresetsArgs, ProbeArgs, ProcessArgs, ProjectAction, ProjectArgs,
};
use crate::domain::errors::ProcessingError;
use crate::domain::model::{MediaInfo, OutputFormat};
use crate::domain::presets;
use crate::engine::LoggingSink;
use crate::error::VideoForgeError;
use crate::ports::TranscodeJob;
use crate::utils::{format_duration, format_file_size};
use crate::utils::time::format_timestamp;

fn processing_failure(err: &ProcessingError) -> anyhow::Error {
    anyhow!("{}\n{}", err.user_message(), err.details())
}

/// Token cancelled on Ctrl+C
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });
    token
}

/// Probe `input`, logging instead of failing when the probe does not work
async fn probe_optional(container: &DefaultAppContainer, input: &Path) -> Option<MediaInfo> {
    match container.probe_port().probe(input).await {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(input = %input.display(), error = %e, "Probe failed");
            None
        }
    }
}

/// Execute the compile command
pub async fn execute_compile(container: &DefaultAppContainer, args: CompileArgs) -> Result<()> {
    let source = match (&args.input, args.width, args.height) {
        (Some(input), _, _) => Some(
            container
                .probe_port()
                .probe(input)
                .await
                .with_context(|| format!("Failed to probe {}", input.display()))?,
        ),
        (None, Some(width), Some(height)) => Some(MediaInfo::new(width, height, 0.0)?),
        _ => None,
    };

    let operations = load_operations(&args.ops, source.as_ref())
        .with_context(|| format!("Failed to load operations from {}", args.ops.display()))?;
    let graph = container
        .compiler()
        .compile(&operations, source.as_ref())
        .map_err(|e| processing_failure(&ProcessingError::from(e)))?;

    let config = container.config();
    let options = config.output.clone();
    let input = args.input.clone().unwrap_or_else(|| "INPUT".into());
    let output = format!("OUTPUT.{}", options.format.extension());
    let job = TranscodeJob::from_graph(
        &graph,
        input,
        output,
        options,
        source.map(|s| s.duration_seconds),
    );
    let engine_args = FfmpegCliAdapter::new(&config.ffmpeg_path, Some(config.threads)).args_for(&job);

    if args.json {
        let document = json!({
            "graph": graph,
            "filterGraph": graph.filter_graph(),
            "args": engine_args,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("Operations: {}", operations.len());
    for (index, operation) in operations.iter().enumerate() {
        println!("  {}. {}", index + 1, operation);
    }
    match graph.trim() {
        Some(trim) => println!(
            "Trim: seek {} for {}",
            format_timestamp(trim.input_seek),
            format_timestamp(trim.input_duration)
        ),
        None => println!("Trim: none"),
    }
    println!(
        "Filter graph: {}",
        graph.filter_graph().as_deref().unwrap_or("(none)")
    );
    println!("Command: {} {}", config.ffmpeg_path.display(), engine_args.join(" "));
    Ok(())
}

/// Execute the process command
pub async fn execute_process(container: &DefaultAppContainer, args: ProcessArgs) -> Result<()> {
    let implied = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension);
    let options = args
        .output_args
        .resolve(&container.config().output, implied)
        .context("Invalid output options")?;

    let source = probe_optional(container, &args.input).await;
    let operations = load_operations(&args.ops, source.as_ref())
        .with_context(|| format!("Failed to load operations from {}", args.ops.display()))?;
    let session = EditorSession::with_operations(operations);

    let label = args.input.display().to_string();
    let result = container
        .process_interactor()
        .process(
            &session,
            ProcessRequest::new(&args.input, options),
            Arc::new(LoggingSink::new(label)),
            interrupt_token(),
        )
        .await
        .map_err(|e| processing_failure(&e))?;

    tokio::fs::write(&args.output, &result.bytes)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} ({}) to {}",
        format_file_size(result.len() as u64),
        result.mime_type,
        args.output.display()
    );
    Ok(())
}

/// Execute the batch command
pub async fn execute_batch(container: &DefaultAppContainer, args: BatchArgs) -> Result<()> {
    let options = args
        .output_args
        .resolve(&container.config().output, None)
        .context("Invalid output options")?;
    let operations = load_operations(&args.ops, None)
        .with_context(|| format!("Failed to load operations from {}", args.ops.display()))?;

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let jobs = BatchJob::into_dir_all(&args.inputs, &args.out_dir, options.format);

    let report = container
        .batch_interactor()
        .run(
            &operations,
            jobs,
            &options,
            Arc::new(LoggingSink::new("batch")),
            &interrupt_token(),
        )
        .await;

    for item in &report.items {
        match &item.outcome {
            Ok(bytes) => println!(
                "ok    {} -> {} ({})",
                item.input.display(),
                item.output.display(),
                format_file_size(*bytes)
            ),
            Err(e) => println!("error {}: {}", item.input.display(), e.user_message()),
        }
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch finished"
    );
    if !report.is_success() {
        bail!("{} of {} jobs failed", report.failed(), report.items.len());
    }
    Ok(())
}

/// Execute the probe command
pub async fn execute_probe(container: &DefaultAppContainer, args: ProbeArgs) -> Result<()> {
    let info = container
        .probe_port()
        .probe(&args.input)
        .await
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File: {}", args.input.display());
        println!("Dimensions: {}x{}", info.width, info.height);
        println!("Aspect ratio: {:.3}", info.aspect_ratio());
        println!("{}", describe_duration(info.duration_seconds));
    }
    Ok(())
}

fn describe_duration(seconds: f64) -> String {
    format!(
        "Duration: {} ({})",
        format_timestamp(seconds),
        format_duration(Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default())
    )
}

/// Execute the presets command
pub fn execute_presets(args: PresetsArgs) -> Result<()> {
    if let Some(name) = args.show {
        let preset = presets::find(&name).ok_or(VideoForgeError::PresetNotFound { name })?;
        let operations = preset.operations()?;
        println!("{}", serde_json::to_string_pretty(&operations)?);
        return Ok(());
    }

    for preset in presets::builtin() {
        println!("{:<14} {}", preset.name, preset.description);
    }
    Ok(())
}

/// Execute the project command
pub fn execute_project(args: ProjectArgs) -> Result<()> {
    match args.action {
        ProjectAction::Save { ops, name, output } => {
            let operations = load_operations(&ops, None)
                .with_context(|| format!("Failed to load operations from {}", ops.display()))?;
            let project = Project::new(name, operations);
            project
                .save(&output)
                .with_context(|| format!("Failed to save project to {}", output.display()))?;
            println!("Saved project '{}' ({}) to {}", project.name, project.id, output.display());
        }
        ProjectAction::Show { path, json } => {
            let project = Project::load(&path)
                .with_context(|| format!("Failed to load project {}", path.display()))?;
            if json {
                println!("{}", project.to_json()?);
                return Ok(());
            }
            println!("Project: {} ({})", project.name, project.id);
            println!("Last modified: {}", project.last_modified.to_rfc3339());
            for (index, operation) in project.operations.iter().enumerate() {
                println!("  {}. {}", index + 1, operation);
            }
        }
    }
    Ok(())
}
