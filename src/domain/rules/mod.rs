// Domain rules - Per-operation validation policies

use tracing::warn;

use crate::domain::errors::ValidationError;
use crate::domain::model::*;

/// Upper bound for filter intensities
pub const MAX_INTENSITY: u32 = 200;

/// Validate a single operation at the boundary.
///
/// Rejects out-of-range values instead of clamping them. The one tolerated overflow is a
/// crop rectangle running past the frame edge, which is logged and left for the compiler
/// to clamp.
pub fn validate(operation: Operation) -> Result<Operation, ValidationError> {
    match &operation {
        Operation::Trim {
            start_time,
            end_time,
        } => validate_trim(*start_time, *end_time)?,
        Operation::Resize { width, height } => {
            if *width == 0 || *height == 0 {
                return Err(ValidationError::NonPositiveDimensions {
                    width: *width,
                    height: *height,
                });
            }
        }
        Operation::Rotate { angle } => {
            if !angle.is_finite() {
                return Err(ValidationError::NonFinite { field: "angle" });
            }
        }
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => {
            validate_crop(*x, *y, *width, *height)?;
            if let Some((right, bottom)) = crop_overflow(*x, *y, *width, *height) {
                warn!(
                    x,
                    y,
                    width,
                    height,
                    right,
                    bottom,
                    "Crop extends past the frame edge and will be clamped"
                );
            }
        }
        Operation::FilterSet { filters } => validate_filters(filters)?,
    }
    Ok(operation)
}

fn validate_trim(start_time: f64, end_time: f64) -> Result<(), ValidationError> {
    if !start_time.is_finite() {
        return Err(ValidationError::NonFinite { field: "startTime" });
    }
    if !end_time.is_finite() {
        return Err(ValidationError::NonFinite { field: "endTime" });
    }
    if start_time < 0.0 {
        return Err(ValidationError::NegativeTrimStart { start: start_time });
    }
    if end_time <= start_time {
        return Err(ValidationError::InvalidTrimRange {
            start: start_time,
            end: end_time,
        });
    }
    Ok(())
}

fn validate_crop(x: f64, y: f64, width: f64, height: f64) -> Result<(), ValidationError> {
    for (field, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite { field });
        }
    }
    for (field, value) in [("x", x), ("y", y)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::CropOutOfRange {
                field,
                range: "[0, 100]",
                value,
            });
        }
    }
    for (field, value) in [("width", width), ("height", height)] {
        if value <= 0.0 || value > 100.0 {
            return Err(ValidationError::CropOutOfRange {
                field,
                range: "(0, 100]",
                value,
            });
        }
    }
    Ok(())
}

fn validate_filters(filters: &FilterSet) -> Result<(), ValidationError> {
    if filters.is_empty() {
        return Err(ValidationError::EmptyFilterSet);
    }
    for (kind, intensity) in filters.iter() {
        if intensity > MAX_INTENSITY {
            return Err(ValidationError::IntensityOutOfRange {
                kind,
                value: i64::from(intensity),
            });
        }
    }
    Ok(())
}

/// Right/bottom edges in percent when a crop runs past the frame, `None` when it fits
pub fn crop_overflow(x: f64, y: f64, width: f64, height: f64) -> Option<(f64, f64)> {
    let right = x + width;
    let bottom = y + height;
    if right > 100.0 || bottom > 100.0 {
        Some((right, bottom))
    } else {
        None
    }
}

#[cfg(test)]
mod tests;
