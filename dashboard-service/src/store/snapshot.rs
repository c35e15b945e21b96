use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::Cache;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("no snapshot at {0}")]
    NotFound(PathBuf),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Full-state JSON snapshot stored in a single file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the last snapshot. A missing file is `SnapshotError::NotFound`.
    pub async fn load(&self) -> Result<Cache, SnapshotError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&raw)?)
    }

    /// Overwrites the snapshot with the full contents of `cache`.
    ///
    /// Written to a sibling temp file first and renamed into place, so readers
    /// never observe a partial document.
    pub async fn save(&self, cache: &Cache) -> Result<(), SnapshotError> {
        let payload = serde_json::to_vec_pretty(cache)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, &payload).await?;

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(
            path = %self.path.display(),
            bytes = payload.len(),
            "Snapshot written"
        );
        Ok(())
    }
}
