//! Local filesystem storage implementation.
//!
//! Baselines live in a single pretty-printed JSON file. Writes go to a
//! sibling temp file that is synced and then renamed over the target, so
//! a crash mid-write never leaves a truncated state file behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::StateMap;
use crate::storage::StateStorage;

/// Local filesystem storage backend.
pub struct LocalStorage {
    path: PathBuf,
    /// Serializes saves so two writers never share the temp file
    write_lock: Mutex<()>,
}

impl LocalStorage {
    /// Create a LocalStorage backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl StateStorage for LocalStorage {
    async fn load(&self) -> Result<StateMap> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => {
                log::warn!("No state file found at {}", self.path.display());
                Ok(StateMap::new())
            }
        }
    }

    async fn save(&self, state: &StateMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let _guard = self.write_lock.lock().await;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::persistence(format!("{}: {e}", self.path.display())))
    }
}
