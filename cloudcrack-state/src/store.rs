//! Local-file stores for the checkpoint and job history
//!
//! Both stores keep a single JSON file on local disk (by convention under
//! `build/`). Reads of a missing file are not errors: the checkpoint store
//! reports `None` and the history store reports an empty list, so a fresh
//! working directory behaves the same as one that was fully cleaned up.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::checkpoint::Checkpoint;
use crate::history::JobRecord;

/// Errors from reading or writing the local state files
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// The file exists but does not parse as the expected shape
    #[error("Invalid state file: {0}")]
    Invalid(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| StoreError::Serialization(format!("Failed to serialize {}: {}", path.display(), e)))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| StoreError::Io(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    fs::write(path, content)
        .map_err(|e| StoreError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

fn remove_if_present(path: &Path) -> StoreResult<()> {
    // A missing file during cleanup is a no-op, not an error
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| StoreError::Io(format!("Failed to remove {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Store for the provisioning checkpoint file
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Default checkpoint file path
    pub const DEFAULT_PATH: &'static str = "build/resources.json";

    /// Create a store at the default path
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_PATH))
    }

    /// Create a store at a specific path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the checkpoint, or `None` if no file exists yet
    pub fn load(&self) -> StoreResult<Option<Checkpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", self.path.display(), e)))?;

        let checkpoint: Checkpoint = serde_json::from_str(&content)
            .map_err(|e| StoreError::Invalid(format!("Failed to parse {}: {}", self.path.display(), e)))?;

        Ok(Some(checkpoint))
    }

    /// Write the checkpoint, creating the parent directory if needed
    pub fn save(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        write_json(&self.path, checkpoint)
    }

    /// Delete the checkpoint file; missing file is a no-op
    pub fn remove(&self) -> StoreResult<()> {
        remove_if_present(&self.path)
    }
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Store for the submitted-job history file
pub struct JobHistoryStore {
    path: PathBuf,
}

impl JobHistoryStore {
    /// Default job-history file path
    pub const DEFAULT_PATH: &'static str = "build/jobs.json";

    /// Create a store at the default path
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_PATH))
    }

    /// Create a store at a specific path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all tracked jobs; a missing file yields an empty list
    pub fn load(&self) -> StoreResult<Vec<JobRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", self.path.display(), e)))?;

        let jobs: Vec<JobRecord> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Invalid(format!("Failed to parse {}: {}", self.path.display(), e)))?;

        Ok(jobs)
    }

    /// Append one record and rewrite the file
    pub fn append(&self, record: JobRecord) -> StoreResult<()> {
        let mut jobs = self.load()?;
        jobs.push(record);
        write_json(&self.path, &jobs)
    }

    /// Delete the history file; missing file is a no-op
    pub fn remove(&self) -> StoreResult<()> {
        remove_if_present(&self.path)
    }
}

impl Default for JobHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
