// Filesystem storage adapter - Staged media artifacts under one root directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::errors::ExecutionError;
use crate::domain::model::MediaHandle;
use crate::ports::StoragePort;

/// Prefix of every staged file name, used to recognize our own artifacts
const ARTIFACT_PREFIX: &str = "vf-";

/// Storage adapter keeping each artifact as one file in `root`
#[derive(Debug, Clone)]
pub struct FsStorageAdapter {
    root: PathBuf,
}

impl FsStorageAdapter {
    /// Create the adapter, creating `root` if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ExecutionError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            ExecutionError::ResourceUnavailable(format!(
                "failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// `<system temp>/videoforge`
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join("videoforge")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty, uniquely named file and return its handle
    fn create_artifact(&self, extension: &str) -> Result<(MediaHandle, PathBuf), ExecutionError> {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        let file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.root)
            .map_err(|e| unavailable("failed to allocate staged file", e))?;
        let (_, path) = file
            .keep()
            .map_err(|e| unavailable("failed to keep staged file", e.error))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExecutionError::ResourceUnavailable("non UTF-8 staged file name".into()))?;
        Ok((MediaHandle::new(name), path))
    }

    /// Delete staged artifacts older than `max_age`. Returns how many were removed.
    pub fn purge_stale(&self, max_age: Duration) -> Result<usize, ExecutionError> {
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable storage entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let is_artifact = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(ARTIFACT_PREFIX));
            if !is_artifact {
                continue;
            }

            let age = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .and_then(|modified| now.duration_since(modified).ok());
            if matches!(age, Some(age) if age >= max_age) {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to purge"),
                }
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Purged stale artifacts");
        }
        Ok(removed)
    }
}

#[async_trait]
impl StoragePort for FsStorageAdapter {
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<MediaHandle, ExecutionError> {
        let (handle, path) = self.create_artifact(extension)?;
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            let _ = fs::remove_file(&path);
            return Err(unavailable("failed to write staged file", e));
        }
        debug!(%handle, bytes = bytes.len(), "Saved artifact");
        Ok(handle)
    }

    async fn read(&self, handle: &MediaHandle) -> Result<Vec<u8>, ExecutionError> {
        let path = self.locate(handle)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| unavailable(&format!("failed to read {}", handle), e))
    }

    async fn delete(&self, handle: &MediaHandle) -> Result<(), ExecutionError> {
        let path = self.locate(handle)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%handle, "Deleted artifact");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(&format!("failed to delete {}", handle), e)),
        }
    }

    async fn allocate(&self, extension: &str) -> Result<MediaHandle, ExecutionError> {
        let (handle, _) = self.create_artifact(extension)?;
        debug!(%handle, "Allocated artifact");
        Ok(handle)
    }

    fn locate(&self, handle: &MediaHandle) -> Result<PathBuf, ExecutionError> {
        let name = handle.as_str();
        let is_plain_name = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !is_plain_name {
            return Err(ExecutionError::ResourceUnavailable(format!(
                "invalid media handle: {}",
                name
            )));
        }
        Ok(self.root.join(name))
    }
}

fn unavailable(context: &str, err: io::Error) -> ExecutionError {
    ExecutionError::ResourceUnavailable(format!("{}: {}", context, err))
}
