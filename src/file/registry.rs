//! File registry: the authoritative metadata table plus the per-user history
//! index, persisted as a single JSON snapshot.
//!
//! The whole table lives in memory behind one `RwLock`; every mutation
//! rewrites the snapshot wholesale (no incremental log), which preserves the
//! original durability model: state survives a process restart, nothing more.
//! The registry-wide write lock also serializes the read-modify-write
//! sequences that the original got away with only because it was
//! single-threaded.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{FileRecord, FolderMember, HistoryEntry, Visibility};
use crate::{ByshareError, Result};

/// Snapshot layout: `{ "files": [...], "userUploads": {...} }`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryState {
    #[serde(default)]
    files: Vec<FileRecord>,
    #[serde(rename = "userUploads", default)]
    user_uploads: HashMap<String, Vec<HistoryEntry>>,
}

/// Authoritative registry of all uploaded files and folders.
#[derive(Debug)]
pub struct FileRegistry {
    inner: RwLock<RegistryState>,
    snapshot_path: Option<PathBuf>,
}

impl FileRegistry {
    /// Open a registry backed by a snapshot file, loading existing state.
    ///
    /// A missing snapshot starts empty; a corrupt one is logged and replaced
    /// on the next write rather than aborting startup.
    pub fn open(snapshot_path: impl Into<PathBuf>) -> Result<Self> {
        let snapshot_path = snapshot_path.into();

        if let Some(parent) = snapshot_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let state = match fs::read(&snapshot_path) {
            Ok(bytes) => match serde_json::from_slice::<RegistryState>(&bytes) {
                Ok(state) => {
                    tracing::info!(
                        files = state.files.len(),
                        "Loaded registry snapshot from {}",
                        snapshot_path.display()
                    );
                    state
                }
                Err(e) => {
                    tracing::warn!("Corrupt registry snapshot, starting empty: {}", e);
                    RegistryState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryState::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: RwLock::new(state),
            snapshot_path: Some(snapshot_path),
        })
    }

    /// Create a registry with no snapshot persistence (tests, tooling).
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(RegistryState::default()),
            snapshot_path: None,
        }
    }

    /// Insert a new record and its paired history entry.
    ///
    /// Ids are unique; inserting an id that is already registered is refused.
    pub fn insert(&self, record: FileRecord) -> Result<()> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        if state.files.iter().any(|f| f.id == record.id) {
            return Err(ByshareError::Storage(format!(
                "id {} is already registered",
                record.id
            )));
        }

        let entry = HistoryEntry::from_record(&record);
        state
            .user_uploads
            .entry(record.owner.clone())
            .or_default()
            .push(entry);
        state.files.push(record);

        self.save(&state)
    }

    /// Raw lookup by id. No expiry or password evaluation; that is the
    /// access gate's job.
    pub fn get(&self, id: &str) -> Option<FileRecord> {
        let state = self.inner.read().expect("registry lock poisoned");
        state.files.iter().find(|f| f.id == id).cloned()
    }

    /// Land one folder member: append to the folder record if it exists, or
    /// create it from `template` on the first member. A single write lock
    /// covers the whole decision, so two racing first members cannot both
    /// create the record.
    ///
    /// `template` carries the folder metadata (owner, options, zero size);
    /// the member's size is added on top in either branch. An existing record
    /// that is not a folder, or that belongs to a different owner, is
    /// rejected.
    pub fn upsert_folder_member(
        &self,
        folder_id: &str,
        member: FolderMember,
        template: FileRecord,
    ) -> Result<FileRecord> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let Some(index) = state.files.iter().position(|f| f.id == folder_id) else {
            let mut record = template;
            record.size_bytes += member.size_bytes;
            record.members.push(member);

            let entry = HistoryEntry::from_record(&record);
            state
                .user_uploads
                .entry(record.owner.clone())
                .or_default()
                .push(entry);
            state.files.push(record.clone());

            self.save(&state)?;
            return Ok(record);
        };

        {
            let record = &state.files[index];
            if !record.is_folder {
                return Err(ByshareError::Validation(format!(
                    "{folder_id} is not a folder upload"
                )));
            }
            if record.owner != template.owner {
                return Err(ByshareError::Validation(
                    "folder belongs to a different uploader".to_string(),
                ));
            }
        }

        let record = &mut state.files[index];
        record.size_bytes += member.size_bytes;
        record.members.push(member);
        let owner = record.owner.clone();
        let new_size = record.size_bytes;
        let updated = record.clone();

        if let Some(entry) = Self::history_entry_mut(&mut state, &owner, folder_id) {
            entry.file_size = new_size;
        }

        self.save(&state)?;
        Ok(updated)
    }

    /// Mark a folder as completed, returning the record on the first
    /// transition only. Unknown ids, non-folders, and repeat completions
    /// yield `None`. The flag is part of the snapshot, so a completion
    /// survives a restart and cannot fire twice.
    pub fn complete_folder(&self, id: &str) -> Result<Option<FileRecord>> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let Some(record) = state.files.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if !record.is_folder || record.completed {
            return Ok(None);
        }
        record.completed = true;
        let completed = record.clone();

        self.save(&state)?;
        Ok(Some(completed))
    }

    /// Update visibility, propagating to the history entry.
    pub fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<bool> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let Some(record) = state.files.iter_mut().find(|f| f.id == id) else {
            return Ok(false);
        };
        record.visibility = visibility;
        let owner = record.owner.clone();

        if let Some(entry) = Self::history_entry_mut(&mut state, &owner, id) {
            entry.visibility = visibility;
        }

        self.save(&state)?;
        Ok(true)
    }

    /// Update the expiry timestamp, propagating to the history entry.
    ///
    /// The caller is responsible for clamping; stored values are not
    /// re-validated here.
    pub fn update_expiry(&self, id: &str, expires_at: Option<DateTime<Utc>>) -> Result<bool> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let Some(record) = state.files.iter_mut().find(|f| f.id == id) else {
            return Ok(false);
        };
        record.expires_at = expires_at;
        let owner = record.owner.clone();

        if let Some(entry) = Self::history_entry_mut(&mut state, &owner, id) {
            entry.expiry_date = expires_at;
        }

        self.save(&state)?;
        Ok(true)
    }

    /// Remove a record and its history entry, returning the removed record.
    ///
    /// Idempotent: a second delete for the same id returns `None`.
    pub fn delete(&self, id: &str) -> Result<Option<FileRecord>> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let Some(index) = state.files.iter().position(|f| f.id == id) else {
            return Ok(None);
        };
        let record = state.files.remove(index);

        if let Some(entries) = state.user_uploads.get_mut(&record.owner) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                state.user_uploads.remove(&record.owner);
            }
        }

        self.save(&state)?;
        Ok(Some(record))
    }

    /// Append a moderation report. Unlimited, no dedup or rate limit.
    ///
    /// Returns `false` if the id is unknown (including already-deleted).
    pub fn report(&self, id: &str, reason: impl Into<String>) -> Result<bool> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let Some(record) = state.files.iter_mut().find(|f| f.id == id) else {
            return Ok(false);
        };
        record.report_count += 1;
        record.report_reasons.push(reason.into());

        self.save(&state)?;
        Ok(true)
    }

    /// All records, for the admin listing. Redaction happens in the DTO
    /// layer; the password hash never leaves the web boundary.
    pub fn list_all(&self) -> Vec<FileRecord> {
        let state = self.inner.read().expect("registry lock poisoned");
        state.files.clone()
    }

    /// Sum of `size_bytes` over all records.
    pub fn total_storage_bytes(&self) -> u64 {
        let state = self.inner.read().expect("registry lock poisoned");
        state.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Upload history for an owner, newest first.
    pub fn history_for(&self, owner: &str) -> Vec<HistoryEntry> {
        let state = self.inner.read().expect("registry lock poisoned");
        let mut entries = state
            .user_uploads
            .get(owner)
            .cloned()
            .unwrap_or_default();
        entries.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        entries
    }

    /// Rebuild the history index from the records.
    ///
    /// The history is an advisory materialized view; if it ever drifts from
    /// the registry, this recomputes it from the source of truth.
    pub fn rebuild_history(&self) -> Result<()> {
        let mut state = self.inner.write().expect("registry lock poisoned");

        let mut rebuilt: HashMap<String, Vec<HistoryEntry>> = HashMap::new();
        for record in &state.files {
            rebuilt
                .entry(record.owner.clone())
                .or_default()
                .push(HistoryEntry::from_record(record));
        }
        state.user_uploads = rebuilt;

        self.save(&state)
    }

    fn history_entry_mut<'a>(
        state: &'a mut RegistryState,
        owner: &str,
        id: &str,
    ) -> Option<&'a mut HistoryEntry> {
        state
            .user_uploads
            .get_mut(owner)?
            .iter_mut()
            .find(|e| e.id == id)
    }

    /// Rewrite the snapshot wholesale. Called with the write lock held, which
    /// keeps snapshot contents consistent with in-memory state and serializes
    /// writers.
    fn save(&self, state: &RegistryState) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec(state)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
