// Domain errors - Error taxonomy for validation, compilation and execution

use thiserror::Error;

use crate::domain::model::FilterKind;

/// A single operation (or payload entry) is malformed.
///
/// Raised at the boundary where operations enter an [`OperationList`](crate::domain::model::OperationList);
/// the compiler never sees an operation that failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Trim start is negative
    #[error("trim start must be >= 0, got {start}")]
    NegativeTrimStart { start: f64 },

    /// Trim end does not come after trim start
    #[error("trim end ({end}) must be greater than start ({start})")]
    InvalidTrimRange { start: f64, end: f64 },

    /// Resize target has a zero dimension
    #[error("resize dimensions must be positive, got {width}x{height}")]
    NonPositiveDimensions { width: u32, height: u32 },

    /// Crop field outside its percentage range
    #[error("crop {field} must be within {range}, got {value}")]
    CropOutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    /// Filter intensity outside [0, 200]
    #[error("{kind} intensity must be within [0, 200], got {value}")]
    IntensityOutOfRange { kind: FilterKind, value: i64 },

    /// Filter set carries no entries
    #[error("filter set must contain at least one filter")]
    EmptyFilterSet,

    /// NaN or infinite number in an operation field
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    /// Payload could not be interpreted as an operation
    #[error("malformed operation payload: {0}")]
    MalformedPayload(String),

    /// Output options that cannot be combined
    #[error("incompatible output options: {0}")]
    IncompatibleOutput(String),
}

/// Compiling an operation list failed. Deterministic: retrying the same input never helps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Nothing to compile
    #[error("operation list is empty")]
    EmptyOperationList,

    /// Operation or filter kind the compiler does not know
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Crop requested but source dimensions are unknown
    #[error("crop cannot be resolved: source dimensions are unavailable")]
    UnresolvableCrop,
}

impl CompileError {
    /// Compile failures are input errors; the caller has to change the operation list.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Running a compiled graph against the engine failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Engine exited non-zero or the binding raised; carries the raw diagnostic verbatim
    #[error("engine failure: {0}")]
    EngineFailure(String),

    /// Invocation was cancelled by the caller
    #[error("processing cancelled")]
    Cancelled,

    /// Staging storage, engine slot or session unavailable
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
}

impl ExecutionError {
    /// Engine failures and resource shortages may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExecutionError::EngineFailure(_) | ExecutionError::ResourceUnavailable(_)
        )
    }
}

/// Every failure the result channel can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ProcessingError {
    /// Short message for end users, derived from the error kind only.
    pub fn user_message(&self) -> &'static str {
        match self {
            ProcessingError::Validation(_) => "One of the edits is invalid. Please review it.",
            ProcessingError::Compile(CompileError::EmptyOperationList) => {
                "Add at least one edit before processing."
            }
            ProcessingError::Compile(CompileError::UnsupportedOperation(_)) => {
                "This edit is not supported."
            }
            ProcessingError::Compile(CompileError::UnresolvableCrop) => {
                "The video dimensions could not be read, so the crop cannot be applied."
            }
            ProcessingError::Execution(ExecutionError::EngineFailure(_)) => {
                "The video engine could not process this file."
            }
            ProcessingError::Execution(ExecutionError::Cancelled) => "Processing was cancelled.",
            ProcessingError::Execution(ExecutionError::ResourceUnavailable(_)) => {
                "The editor is busy or out of resources. Try again shortly."
            }
        }
    }

    /// Full diagnostic text, including raw engine output.
    pub fn details(&self) -> String {
        self.to_string()
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProcessingError::Validation(_) => false,
            ProcessingError::Compile(e) => e.is_retryable(),
            ProcessingError::Execution(e) => e.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_keeps_raw_diagnostic() {
        let raw = "[Parsed_crop_0 @ 0x55] Invalid too big or non positive size";
        let err = ProcessingError::from(ExecutionError::EngineFailure(raw.to_string()));

        assert!(err.details().contains(raw));
        assert_ne!(err.user_message(), raw);
    }

    #[test]
    fn test_retry_classification() {
        assert!(!CompileError::EmptyOperationList.is_retryable());
        assert!(!CompileError::UnresolvableCrop.is_retryable());
        assert!(ExecutionError::EngineFailure("x".into()).is_retryable());
        assert!(ExecutionError::ResourceUnavailable("disk".into()).is_retryable());
        assert!(!ExecutionError::Cancelled.is_retryable());
        assert!(!ProcessingError::from(ValidationError::EmptyFilterSet).is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = ValidationError::InvalidTrimRange {
            start: 5.0,
            end: 2.0,
        };
        assert_eq!(err.to_string(), "trim end (2) must be greater than start (5)");
        assert_eq!(
            CompileError::UnsupportedOperation("speed".into()).to_string(),
            "unsupported operation: speed"
        );
    }
}
