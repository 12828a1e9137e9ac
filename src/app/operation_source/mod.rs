// Operation source - Reads operation lists from JSON or YAML files

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::domain::legacy::normalize_payload;
use crate::domain::model::{MediaInfo, OperationList};
use crate::error::{VideoForgeError, VideoForgeResult};

/// Parse `content` as JSON, or as YAML when `yaml` is set, then normalize it
pub fn parse_operations(
    content: &str,
    yaml: bool,
    source: Option<&MediaInfo>,
) -> VideoForgeResult<OperationList> {
    let payload: Value = if yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    Ok(normalize_payload(&payload, source)?)
}

/// Load an operation file. Project files work too, only their operations are read.
///
/// `source` resolves pixel-unit crops.
pub fn load_operations(path: &Path, source: Option<&MediaInfo>) -> VideoForgeResult<OperationList> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    let yaml = match extension.as_deref() {
        Some("json") => false,
        Some("yaml") | Some("yml") => true,
        _ => {
            return Err(VideoForgeError::UnsupportedOperationFile {
                path: path.display().to_string(),
            })
        }
    };

    let content = std::fs::read_to_string(path)?;
    let operations = parse_operations(&content, yaml, source)?;
    debug!(path = %path.display(), operations = operations.len(), "Loaded operations");
    Ok(operations)
}
