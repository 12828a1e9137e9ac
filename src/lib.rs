//! VideoForge Library
//!
//! Compiles a web video editor's operation list (trim, resize, rotate, crop, color
//! filters) into an ffmpeg filter graph, runs it, and reports progress and results
//! through a single-terminal result channel.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod compiler;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use compiler::{compile, GraphCompiler};
pub use domain::errors::{CompileError, ExecutionError, ProcessingError, ValidationError};
pub use domain::model::{
    CompiledGraph, FilterKind, FilterSet, FilterStage, MediaInfo, Operation, OperationList,
    OutputOptions, ProcessingResult, TrimDirective,
};
pub use error::{VideoForgeError, VideoForgeResult};
