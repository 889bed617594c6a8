//! Artifact store: disk persistence for uploaded payloads.
//!
//! Payloads are stored in a sharded directory structure keyed by the first
//! two characters of the file id:
//!
//! ```text
//! {base_path}/
//! ├── ab/
//! │   ├── ab12...x9        (single file)
//! │   └── ab34...k2/       (folder upload)
//! │       ├── docs/readme.md
//! │       └── src/main.c
//! └── ...
//! ```
//!
//! Writes are idempotent overwrites so a retried member upload lands on the
//! same key without error.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::{ByshareError, Result};

/// Disk-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Base directory for artifact storage.
    base_path: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// The base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist a payload under `id`, or under `(id, relative_path)` for a
    /// folder member. Overwrites any existing payload at the same key.
    pub fn put(&self, id: &str, relative_path: Option<&str>, bytes: &[u8]) -> Result<()> {
        let path = self.artifact_path(id, relative_path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, bytes)?;
        Ok(())
    }

    /// Read a payload back.
    pub fn get(&self, id: &str, relative_path: Option<&str>) -> Result<Vec<u8>> {
        let path = self.artifact_path(id, relative_path)?;

        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ByshareError::NotFound(format!("artifact {id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every payload stored under `id` (single file or all folder
    /// members). Returns `false` if nothing was stored, which is not an
    /// error: deletion is best-effort.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let path = self.artifact_path(id, None)?;

        let removed = if path.is_dir() {
            match fs::remove_dir_all(&path) {
                Ok(()) => true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            }
        } else {
            match fs::remove_file(&path) {
                Ok(()) => true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            }
        };

        Ok(removed)
    }

    /// Whether a payload exists at the given key.
    pub fn exists(&self, id: &str, relative_path: Option<&str>) -> bool {
        self.artifact_path(id, relative_path)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Resolve the on-disk path for a key, validating both components.
    fn artifact_path(&self, id: &str, relative_path: Option<&str>) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ByshareError::Validation(format!("invalid artifact id: {id}")));
        }

        let shard = &id[..2.min(id.len())];
        let mut path = self.base_path.join(shard).join(id);

        if let Some(rel) = relative_path {
            path.push(Self::sanitize_relative(rel)?);
        }

        Ok(path)
    }

    /// Reject absolute paths and parent-directory components in member paths.
    fn sanitize_relative(rel: &str) -> Result<PathBuf> {
        let candidate = Path::new(rel);
        let mut clean = PathBuf::new();

        for component in candidate.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(ByshareError::Validation(format!(
                        "invalid relative path: {rel}"
                    )))
                }
            }
        }

        if clean.as_os_str().is_empty() {
            return Err(ByshareError::Validation("empty relative path".to_string()));
        }

        Ok(clean)
    }
}
