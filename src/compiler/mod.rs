//! Operation list to filter graph compilation
//!
//! Trims become an input-side seek directive, every other operation becomes exactly one
//! filter stage in the order the user added it. The compiler is pure: it reads a snapshot
//! of the list plus probed source dimensions and builds a fresh [`CompiledGraph`].

use tracing::{debug, info};

use crate::domain::errors::CompileError;
use crate::domain::model::*;

pub mod stages;

/// Filter graph compiler
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphCompiler;

impl GraphCompiler {
    /// Create a new graph compiler
    pub fn new() -> Self {
        Self
    }

    /// Compile `operations` into filter stages plus an optional trim directive.
    ///
    /// `source` carries probed dimensions and is only consulted for crops.
    pub fn compile(
        &self,
        operations: &OperationList,
        source: Option<&MediaInfo>,
    ) -> Result<CompiledGraph, CompileError> {
        if operations.is_empty() {
            return Err(CompileError::EmptyOperationList);
        }

        let mut trim: Option<TrimDirective> = None;
        // Crops resolve against this, not the source, once earlier stages reshape the frame
        let mut frame = source.map(stages::FrameSize::of);
        let mut filter_stages = Vec::with_capacity(operations.len());

        for operation in operations {
            let stage = match operation {
                Operation::Trim {
                    start_time,
                    end_time,
                } => {
                    if let Some(previous) = trim.replace(TrimDirective::new(*start_time, *end_time)) {
                        debug!(
                            seek = previous.input_seek,
                            duration = previous.input_duration,
                            "Superseding earlier trim"
                        );
                    }
                    continue;
                }
                Operation::Resize { width, height } => {
                    frame = frame.map(|_| stages::FrameSize::Exact {
                        width: *width,
                        height: *height,
                    });
                    stages::scale(*width, *height)
                }
                Operation::Rotate { angle } => {
                    frame = frame.map(|f| f.rotated(*angle));
                    stages::rotate(*angle)
                }
                Operation::Crop {
                    x,
                    y,
                    width,
                    height,
                } => {
                    let current = frame.ok_or(CompileError::UnresolvableCrop)?;
                    let (stage, next) = stages::crop(*x, *y, *width, *height, current);
                    frame = Some(next);
                    stage
                }
                Operation::FilterSet { filters } => stages::color(filters),
            };
            debug!(kind = operation.kind(), descriptor = %stage, "Compiled stage");
            filter_stages.push(stage);
        }

        let graph = CompiledGraph::new(filter_stages, trim);
        info!(
            operations = operations.len(),
            stages = graph.stage_count(),
            trimmed = graph.trim().is_some(),
            "Compiled filter graph"
        );
        Ok(graph)
    }
}

/// Compile with a default [`GraphCompiler`]
pub fn compile(
    operations: &OperationList,
    source: Option<&MediaInfo>,
) -> Result<CompiledGraph, CompileError> {
    GraphCompiler::new().compile(operations, source)
}
