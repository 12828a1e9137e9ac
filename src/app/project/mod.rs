// Project files - Saved operation lists

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::app::editor_session::EditorSession;
use crate::domain::legacy::normalize_payload;
use crate::domain::model::OperationList;
use crate::error::{VideoForgeError, VideoForgeResult};

/// A named operation list persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Validated on load like any other operation list
    pub operations: OperationList,
    pub last_modified: DateTime<Utc>,
}

/// On-disk shape; operations stay raw until normalized
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    id: String,
    name: String,
    operations: Value,
    last_modified: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>, operations: OperationList) -> Self {
        let now = Utc::now();
        Self {
            id: format!("project-{}", now.timestamp_millis()),
            name: name.into(),
            operations,
            last_modified: now,
        }
    }

    /// Capture the session's current operations
    pub fn from_session(name: impl Into<String>, session: &EditorSession) -> Self {
        Self::new(name, session.snapshot())
    }

    /// Open a fresh session on this project's operations
    pub fn to_session(&self) -> EditorSession {
        EditorSession::with_operations(self.operations.clone())
    }

    /// Replace the operations and bump `last_modified`
    pub fn update(&mut self, operations: OperationList) {
        self.operations = operations;
        self.last_modified = Utc::now();
    }

    pub fn to_json(&self) -> VideoForgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> VideoForgeResult<Self> {
        let file: ProjectFile = serde_json::from_str(json)
            .map_err(|e| VideoForgeError::project(format!("invalid project file: {}", e)))?;
        if file.name.trim().is_empty() {
            return Err(VideoForgeError::project("project name is empty"));
        }
        let operations = normalize_payload(&file.operations, None)?;
        Ok(Self {
            id: file.id,
            name: file.name,
            operations,
            last_modified: file.last_modified,
        })
    }

    pub fn save(&self, path: &Path) -> VideoForgeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), operations = self.operations.len(), "Saved project");
        Ok(())
    }

    pub fn load(path: &Path) -> VideoForgeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{CompileError, ProcessingError, ValidationError};
    use crate::domain::model::Operation;

    fn project_json(operations: &str) -> String {
        format!(
            r#"{{
            "id": "project-1",
            "name": "Broken",
            "operations": {},
            "lastModified": "2024-03-01T12:00:00Z"
        }}"#,
            operations
        )
    }

    fn ops() -> OperationList {
        OperationList::from_operations(vec![Operation::trim(1.0, 4.0), Operation::rotate(90.0)])
            .unwrap()
    }

    #[test]
    fn test_json_shape() {
        let project = Project::new("Holiday", ops());
        let value: serde_json::Value = serde_json::from_str(&project.to_json().unwrap()).unwrap();

        assert_eq!(value["name"], "Holiday");
        assert!(value["id"].as_str().unwrap().starts_with("project-"));
        assert!(value["lastModified"].is_string());
        assert_eq!(value["operations"][0]["type"], "trim");
        assert_eq!(value["operations"][0]["startTime"], 1.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("projects").join("holiday.json");
        let project = Project::new("Holiday", ops());

        project.save(&path).unwrap();
        assert_eq!(Project::load(&path).unwrap(), project);
    }

    #[test]
    fn test_invalid_operations_are_rejected_on_load() {
        let json = project_json(r#"[{ "type": "trim", "startTime": 5, "endTime": 1 }]"#);
        assert!(matches!(
            Project::from_json(&json),
            Err(VideoForgeError::Processing(ProcessingError::Validation(
                ValidationError::InvalidTrimRange { .. }
            )))
        ));
    }

    #[test]
    fn test_unknown_operation_type_in_project() {
        let json = project_json(r#"[{ "type": "speed", "factor": 2 }]"#);
        assert!(matches!(
            Project::from_json(&json),
            Err(VideoForgeError::Processing(ProcessingError::Compile(
                CompileError::UnsupportedOperation(_)
            )))
        ));
    }

    #[test]
    fn test_project_with_legacy_operations() {
        let json = project_json(r#"[{ "type": "filter", "filter": "sepia" }]"#);
        let project = Project::from_json(&json).unwrap();
        assert_eq!(project.operations.len(), 1);
        assert_eq!(project.name, "Broken");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let json = project_json("[]").replace("Broken", " ");
        assert!(matches!(
            Project::from_json(&json),
            Err(VideoForgeError::Project { .. })
        ));
    }

    #[test]
    fn test_session_round_trip() {
        let project = Project::new("Holiday", ops());
        let session = project.to_session();
        let copy = Project::from_session("Copy", &session);
        assert_eq!(copy.operations, project.operations);
    }
}
