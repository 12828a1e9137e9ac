//! Normalization of editor payloads into the operation model
//!
//! Earlier editor revisions sent the same operations in several shapes:
//!
//! - crop as `x/y/width/height` or `cropX/cropY/cropWidth/cropHeight` percentages, or as
//!   pixels when tagged with `"unit": "px"`
//! - filters as a `filters` map, or one `filter` name with an `intensity`
//! - trim as `startTime/endTime`, `start/end`, or `startTime/duration`
//!
//! Everything is funneled through [`normalize_payload`], which validates each operation
//! and rejects unknown kinds instead of skipping them.

use serde_json::{Map, Value};

use crate::domain::errors::{CompileError, ProcessingError, ValidationError};
use crate::domain::model::*;

/// Intensity assumed when a single-filter payload omits it
const DEFAULT_INTENSITY: u32 = 100;

type Object = Map<String, Value>;

/// Normalize an array of operations (or `{ "operations": [...] }`) into a validated list.
///
/// `source` is only needed for pixel-unit crops.
pub fn normalize_payload(
    payload: &Value,
    source: Option<&MediaInfo>,
) -> Result<OperationList, ProcessingError> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(obj) => match obj.get("operations") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(malformed("expected an array of operations"));
            }
        },
        _ => return Err(malformed("expected an array of operations")),
    };

    let mut list = OperationList::new();
    for (index, entry) in entries.iter().enumerate() {
        let operation = normalize_operation(entry, source).map_err(|e| match e {
            ProcessingError::Validation(ValidationError::MalformedPayload(msg)) => {
                malformed(format!("operation #{}: {}", index, msg))
            }
            other => other,
        })?;
        list.push(operation)?;
    }
    Ok(list)
}

/// Normalize a single operation object
pub fn normalize_operation(
    value: &Value,
    source: Option<&MediaInfo>,
) -> Result<Operation, ProcessingError> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed("operation must be an object"))?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("operation is missing its \"type\""))?;

    let operation = match kind {
        "trim" => normalize_trim(obj)?,
        "resize" => Operation::resize(
            dimension(obj, "width")?,
            dimension(obj, "height")?,
        ),
        "rotate" => Operation::rotate(number(obj, &["angle"])?),
        "crop" => normalize_crop(obj, source)?,
        "filter" | "filters" => normalize_filter(obj)?,
        other => {
            return Err(CompileError::UnsupportedOperation(other.to_string()).into());
        }
    };

    Ok(operation.validate()?)
}

fn normalize_trim(obj: &Object) -> Result<Operation, ProcessingError> {
    let start = number(obj, &["startTime", "start"])?;
    let end = match optional_number(obj, &["endTime", "end"])? {
        Some(end) => end,
        None => start + number(obj, &["duration"])?,
    };
    Ok(Operation::trim(start, end))
}

fn normalize_crop(obj: &Object, source: Option<&MediaInfo>) -> Result<Operation, ProcessingError> {
    let x = number(obj, &["x", "cropX"])?;
    let y = number(obj, &["y", "cropY"])?;
    let width = number(obj, &["width", "cropWidth"])?;
    let height = number(obj, &["height", "cropHeight"])?;

    let pixel_units = matches!(obj.get("unit").and_then(Value::as_str), Some("px"));
    if !pixel_units {
        return Ok(Operation::crop(x, y, width, height));
    }

    let source = source.ok_or(CompileError::UnresolvableCrop)?;
    let w = f64::from(source.width);
    let h = f64::from(source.height);
    Ok(Operation::crop(
        x / w * 100.0,
        y / h * 100.0,
        width / w * 100.0,
        height / h * 100.0,
    ))
}

fn normalize_filter(obj: &Object) -> Result<Operation, ProcessingError> {
    let mut filters = FilterSet::new();

    if let Some(map) = obj.get("filters") {
        let map = map
            .as_object()
            .ok_or_else(|| malformed("\"filters\" must be an object"))?;
        for (name, value) in map {
            let kind: FilterKind = name.parse()?;
            filters.insert(kind, intensity(kind, value)?);
        }
    } else if let Some(name) = obj.get("filter") {
        let name = name
            .as_str()
            .ok_or_else(|| malformed("\"filter\" must be a string"))?;
        let kind: FilterKind = name.parse()?;
        let value = match obj.get("intensity") {
            Some(value) => intensity(kind, value)?,
            None => DEFAULT_INTENSITY,
        };
        filters.insert(kind, value);
    } else {
        return Err(malformed("filter operation needs \"filters\" or \"filter\""));
    }

    Ok(Operation::filters(filters))
}

fn intensity(kind: FilterKind, value: &Value) -> Result<u32, ProcessingError> {
    let raw = value
        .as_f64()
        .ok_or_else(|| malformed(format!("{} intensity must be a number", kind)))?;
    let rounded = raw.round();
    if !(0.0..=f64::from(u32::MAX)).contains(&rounded) {
        return Err(ValidationError::IntensityOutOfRange {
            kind,
            value: rounded as i64,
        }
        .into());
    }
    Ok(rounded as u32)
}

fn dimension(obj: &Object, key: &'static str) -> Result<u32, ProcessingError> {
    let value = number(obj, &[key])?.round();
    if value < 0.0 || value > f64::from(u32::MAX) {
        return Err(malformed(format!("{} is out of range", key)));
    }
    Ok(value as u32)
}

fn number(obj: &Object, keys: &[&str]) -> Result<f64, ProcessingError> {
    optional_number(obj, keys)?.ok_or_else(|| malformed(format!("missing \"{}\"", keys[0])))
}

fn optional_number(obj: &Object, keys: &[&str]) -> Result<Option<f64>, ProcessingError> {
    for key in keys {
        if let Some(value) = obj.get(*key) {
            return match value {
                Value::Number(n) => Ok(n.as_f64()),
                // Form posts sometimes send numbers as strings
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| malformed(format!("\"{}\" is not a number", key))),
                _ => Err(malformed(format!("\"{}\" is not a number", key))),
            };
        }
    }
    Ok(None)
}

fn malformed(msg: impl Into<String>) -> ProcessingError {
    ValidationError::MalformedPayload(msg.into()).into()
}
