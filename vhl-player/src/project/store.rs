//! Project stores
//!
//! The editor persists through [`ProjectStore`]; the blob behind it is
//! interchangeable. `JsonFileStore` writes one JSON document atomically
//! (temp file + rename). `MemoryStore` keeps the raw JSON in memory.

use super::PersistedProject;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Blob store for a single saved project
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Replace the saved project
    async fn save(&self, project: &PersistedProject) -> Result<()>;

    /// Saved project, or `None` when nothing has been saved
    ///
    /// A document that cannot be parsed is `Error::CorruptProject`.
    async fn load(&self) -> Result<Option<PersistedProject>>;
}

fn parse_document(raw: &str, origin: &str) -> Result<PersistedProject> {
    serde_json::from_str(raw).map_err(|e| Error::CorruptProject(format!("{}: {}", origin, e)))
}

/// Project stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn save(&self, project: &PersistedProject) -> Result<()> {
        let body = serde_json::to_vec_pretty(project)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::Persistence(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body)
            .await
            .map_err(|e| Error::Persistence(format!("write {}: {}", temp.display(), e)))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| Error::Persistence(format!("rename to {}: {}", self.path.display(), e)))?;

        info!("Project saved to {}", self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedProject>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No project file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let project = parse_document(&raw, &self.path.display().to_string())?;
        debug!("Project loaded from {}", self.path.display());
        Ok(Some(project))
    }
}

/// In-memory project store
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a raw document in the store, valid or not
    pub fn put_raw(&self, raw: impl Into<String>) {
        *self.lock() = Some(raw.into());
    }

    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.document
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn save(&self, project: &PersistedProject) -> Result<()> {
        let raw = serde_json::to_string(project)?;
        *self.lock() = Some(raw);
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedProject>> {
        let raw = self.lock().clone();
        raw.map(|r| parse_document(&r, "memory")).transpose()
    }
}
