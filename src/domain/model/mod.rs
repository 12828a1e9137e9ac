// Domain models - Operations, compiled graphs and processing results

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{CompileError, ValidationError};
use crate::domain::rules;

mod output;

pub use output::{AudioCodec, OutputFormat, OutputOptions, Quality, VideoCodec};

/// Color/blur adjustment kinds. Declaration order is the canonical stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturate,
    Grayscale,
    Sepia,
    Blur,
}

impl FilterKind {
    /// All kinds in canonical order
    pub const CANONICAL_ORDER: [FilterKind; 6] = [
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturate,
        FilterKind::Grayscale,
        FilterKind::Sepia,
        FilterKind::Blur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturate => "saturate",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Blur => "blur",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brightness" => Ok(FilterKind::Brightness),
            "contrast" => Ok(FilterKind::Contrast),
            "saturate" | "saturation" => Ok(FilterKind::Saturate),
            "grayscale" | "greyscale" => Ok(FilterKind::Grayscale),
            "sepia" => Ok(FilterKind::Sepia),
            "blur" => Ok(FilterKind::Blur),
            other => Err(CompileError::UnsupportedOperation(format!("filter:{}", other))),
        }
    }
}

/// Intensity per filter kind, 0..=200 where 100 means "unchanged" for the color adjustments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    entries: BTreeMap<FilterKind, u32>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated kind overwrites the earlier intensity.
    pub fn with(mut self, kind: FilterKind, intensity: u32) -> Self {
        self.entries.insert(kind, intensity);
        self
    }

    pub fn insert(&mut self, kind: FilterKind, intensity: u32) -> Option<u32> {
        self.entries.insert(kind, intensity)
    }

    pub fn get(&self, kind: FilterKind) -> Option<u32> {
        self.entries.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FilterKind, u32)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(FilterKind, u32)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (FilterKind, u32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A single user edit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    /// Keep `[start_time, end_time)` seconds of the source
    #[serde(rename_all = "camelCase")]
    Trim { start_time: f64, end_time: f64 },
    /// Scale to explicit pixel dimensions
    Resize { width: u32, height: u32 },
    /// Rotate by degrees, normalized at compile time
    Rotate { angle: f64 },
    /// Crop rectangle, all fields percentages of the source frame
    Crop {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Combined color/blur adjustments
    #[serde(rename = "filter")]
    FilterSet { filters: FilterSet },
}

impl Operation {
    pub fn trim(start_time: f64, end_time: f64) -> Self {
        Operation::Trim {
            start_time,
            end_time,
        }
    }

    pub fn resize(width: u32, height: u32) -> Self {
        Operation::Resize { width, height }
    }

    pub fn rotate(angle: f64) -> Self {
        Operation::Rotate { angle }
    }

    pub fn crop(x: f64, y: f64, width: f64, height: f64) -> Self {
        Operation::Crop {
            x,
            y,
            width,
            height,
        }
    }

    pub fn filters(filters: FilterSet) -> Self {
        Operation::FilterSet { filters }
    }

    /// Stable kind name, matching the serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Trim { .. } => "trim",
            Operation::Resize { .. } => "resize",
            Operation::Rotate { .. } => "rotate",
            Operation::Crop { .. } => "crop",
            Operation::FilterSet { .. } => "filter",
        }
    }

    pub fn is_trim(&self) -> bool {
        matches!(self, Operation::Trim { .. })
    }

    /// Validate this operation, see [`rules::validate`]
    pub fn validate(self) -> Result<Self, ValidationError> {
        rules::validate(self)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Trim {
                start_time,
                end_time,
            } => write!(f, "Trim {:.2}s-{:.2}s", start_time, end_time),
            Operation::Resize { width, height } => write!(f, "Resize to {}x{}", width, height),
            Operation::Rotate { angle } => write!(f, "Rotate {}°", angle),
            Operation::Crop {
                x,
                y,
                width,
                height,
            } => write!(f, "Crop {}%x{}% at ({}%, {}%)", width, height, x, y),
            Operation::FilterSet { filters } => {
                let parts: Vec<String> = filters
                    .iter()
                    .map(|(kind, value)| format!("{} {}%", kind, value))
                    .collect();
                write!(f, "Filter {}", parts.join(", "))
            }
        }
    }
}

/// Ordered, validated sequence of operations.
///
/// Insertion order decides filter stage order. Every entry has passed validation, also
/// when the list is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct OperationList {
    operations: Vec<Operation>,
}

impl OperationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every operation and keep them in order
    pub fn from_operations(operations: Vec<Operation>) -> Result<Self, ValidationError> {
        let operations = operations
            .into_iter()
            .map(rules::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { operations })
    }

    /// Validate and append
    pub fn push(&mut self, operation: Operation) -> Result<(), ValidationError> {
        let operation = rules::validate(operation)?;
        self.operations.push(operation);
        Ok(())
    }

    /// Append every operation of `other`
    pub fn extend_from(&mut self, other: &OperationList) {
        self.operations.extend(other.operations.iter().cloned());
    }

    pub fn remove(&mut self, index: usize) -> Option<Operation> {
        if index < self.operations.len() {
            Some(self.operations.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }

    /// Whether compiling needs probed source dimensions
    pub fn requires_source_dimensions(&self) -> bool {
        self.operations
            .iter()
            .any(|op| matches!(op, Operation::Crop { .. }))
    }
}

impl TryFrom<Vec<Operation>> for OperationList {
    type Error = ValidationError;

    fn try_from(operations: Vec<Operation>) -> Result<Self, Self::Error> {
        Self::from_operations(operations)
    }
}

impl From<OperationList> for Vec<Operation> {
    fn from(list: OperationList) -> Self {
        list.operations
    }
}

impl<'a> IntoIterator for &'a OperationList {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Probe result for a source media file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
}

impl MediaInfo {
    /// Create media info with validation
    pub fn new(width: u32, height: u32, duration_seconds: f64) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::NonPositiveDimensions { width, height });
        }
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(ValidationError::NonFinite {
                field: "durationSeconds",
            });
        }
        Ok(Self {
            width,
            height,
            duration_seconds,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Opaque reference to a stored media artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaHandle(String);

impl MediaHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input-side seek applied before decoding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimDirective {
    pub input_seek: f64,
    pub input_duration: f64,
}

impl TrimDirective {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            input_seek: start_time,
            input_duration: end_time - start_time,
        }
    }
}

/// What a filter stage does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Scale,
    Rotate,
    Crop,
    Color,
}

/// One stage of the filter graph with its engine descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStage {
    pub kind: StageKind,
    pub descriptor: String,
}

impl FilterStage {
    pub fn new(kind: StageKind, descriptor: impl Into<String>) -> Self {
        Self {
            kind,
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

/// Output of one compile call. Never cached or mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledGraph {
    stages: Vec<FilterStage>,
    trim: Option<TrimDirective>,
}

impl CompiledGraph {
    /// Separator between stages in the engine's filter-graph syntax
    pub const STAGE_JOINER: &'static str = ",";

    pub(crate) fn new(stages: Vec<FilterStage>, trim: Option<TrimDirective>) -> Self {
        Self { stages, trim }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn trim(&self) -> Option<&TrimDirective> {
        self.trim.as_ref()
    }

    /// Joined filter graph, `None` when only a trim was requested
    pub fn filter_graph(&self) -> Option<String> {
        if self.stages.is_empty() {
            return None;
        }
        let descriptors: Vec<&str> = self.stages.iter().map(|s| s.descriptor.as_str()).collect();
        Some(descriptors.join(Self::STAGE_JOINER))
    }

    /// Duration of the produced output, if known
    pub fn output_duration(&self, source_duration: Option<f64>) -> Option<f64> {
        match (&self.trim, source_duration) {
            (Some(trim), Some(total)) => {
                Some(trim.input_duration.min((total - trim.input_seek).max(0.0)))
            }
            (Some(trim), None) => Some(trim.input_duration),
            (None, total) => total,
        }
    }
}

/// Encoded artifact handed to the caller
#[derive(Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ProcessingResult {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingResult")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .finish()
    }
}
