//! Error handling module for VideoForge

use thiserror::Error;

use crate::domain::errors::{CompileError, ExecutionError, ProcessingError, ValidationError};

/// Main error type for VideoForge operations outside the processing pipeline
#[derive(Error, Debug)]
pub enum VideoForgeError {
    /// Timestamp text could not be parsed
    #[error("Invalid timestamp: {value}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimestamp { value: String },

    /// Configuration is missing or inconsistent
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Project file could not be used
    #[error("Project error: {message}")]
    Project { message: String },

    /// No built-in preset with this name
    #[error("Unknown preset: {name}")]
    PresetNotFound { name: String },

    /// Operation file in an unknown format
    #[error("Unsupported operation file: {path}. Expected .json, .yaml or .yml")]
    UnsupportedOperationFile { path: String },

    /// Validation, compile or execution failure
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl From<ValidationError> for VideoForgeError {
    fn from(err: ValidationError) -> Self {
        VideoForgeError::Processing(err.into())
    }
}

impl From<CompileError> for VideoForgeError {
    fn from(err: CompileError) -> Self {
        VideoForgeError::Processing(err.into())
    }
}

impl From<ExecutionError> for VideoForgeError {
    fn from(err: ExecutionError) -> Self {
        VideoForgeError::Processing(err.into())
    }
}

impl VideoForgeError {
    pub fn config(message: impl Into<String>) -> Self {
        VideoForgeError::Config {
            message: message.into(),
        }
    }

    pub fn project(message: impl Into<String>) -> Self {
        VideoForgeError::Project {
            message: message.into(),
        }
    }
}

/// Result type alias for VideoForge operations
pub type VideoForgeResult<T> = std::result::Result<T, VideoForgeError>;
