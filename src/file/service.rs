//! Share service: orchestration of the upload, read, and lifecycle paths.
//!
//! Ordering invariant on the write path: the artifact is persisted before the
//! registry record is inserted, so a record never references a payload that
//! was not written. Quota and validation failures happen before either.

use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::access::AccessGate;
use super::ident::new_id;
use super::password::hash_password;
use super::progress::{ProgressBroker, UploadStatus};
use super::quota::QuotaTracker;
use super::record::{clamp_expiry, FileRecord, FolderMember, HistoryEntry, Visibility};
use super::registry::FileRegistry;
use super::storage::ArtifactStore;
use super::{MAX_FILENAME_LENGTH, STORE_RETRY_ATTEMPTS, STORE_RETRY_BACKOFF};
use crate::{ByshareError, Result};

/// Sharing options attached to an upload.
#[derive(Debug, Clone, Default)]
pub struct ShareOptions {
    /// Access password, hashed before storage.
    pub password: Option<String>,
    /// Requested expiry; clamped to at most one year from now.
    pub expires_at: Option<DateTime<Utc>>,
    /// Public or private.
    pub visibility: Visibility,
}

/// A single upload request (one file, or one folder member).
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Original filename.
    pub name: String,
    /// MIME type as reported by the client.
    pub mime_type: String,
    /// Payload bytes.
    pub content: Vec<u8>,
    /// Uploader identity (anonymous user id or network address).
    pub owner: String,
    /// Sharing options.
    pub options: ShareOptions,
}

/// Result of an authorized download.
#[derive(Debug)]
pub struct Download {
    /// The registry record.
    pub record: FileRecord,
    /// Payload bytes; for folders, a zip archive built on demand.
    pub bytes: Vec<u8>,
    /// Content type for the response.
    pub content_type: String,
    /// Filename for the Content-Disposition header.
    pub file_name: String,
}

/// High-level file sharing service.
#[derive(Debug, Clone)]
pub struct ShareService {
    registry: Arc<FileRegistry>,
    store: Arc<ArtifactStore>,
    quota: Arc<QuotaTracker>,
    progress: Arc<ProgressBroker>,
    gate: AccessGate,
    max_upload_size: u64,
}

impl ShareService {
    /// Create a service over the given components.
    pub fn new(
        registry: Arc<FileRegistry>,
        store: Arc<ArtifactStore>,
        quota: Arc<QuotaTracker>,
        progress: Arc<ProgressBroker>,
        max_upload_size: u64,
    ) -> Self {
        let gate = AccessGate::new(registry.clone(), store.clone());
        Self {
            registry,
            store,
            quota,
            progress,
            gate,
            max_upload_size,
        }
    }

    /// The configured max upload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// The progress broker, for subscription endpoints.
    pub fn progress(&self) -> &Arc<ProgressBroker> {
        &self.progress
    }

    /// Upload a single file.
    ///
    /// Quota is a pre-condition: when the limit is reached the request is
    /// rejected before any artifact write, leaving no partial state.
    pub async fn upload(&self, upload: NewUpload) -> Result<FileRecord> {
        if self.quota.is_limit_reached(&upload.owner) {
            return Err(ByshareError::QuotaExceeded {
                limit: self.quota.daily_limit(),
            });
        }
        self.validate(&upload)?;

        let id = new_id();
        let record = self.build_record(&id, &upload, false)?;

        self.put_with_retry(&id, None, &upload.content).await?;
        self.registry.insert(record.clone())?;
        self.quota.increment(&upload.owner);

        tracing::info!(id = %id, size = record.size_bytes, "File uploaded");
        Ok(record)
    }

    /// Upload one member of a folder.
    ///
    /// The first member under a `folder_upload_id` creates the folder record;
    /// subsequent members append to it. The create-or-append decision happens
    /// under the registry's write lock, so concurrent first members land on
    /// one record. Quota is checked on creation and incremented only on the
    /// folder's logical completion ([`Self::record_folder_progress`]), so the
    /// whole folder counts as one unit.
    pub async fn upload_folder_member(
        &self,
        folder_upload_id: &str,
        relative_path: &str,
        upload: NewUpload,
    ) -> Result<FileRecord> {
        self.validate(&upload)?;

        let member = FolderMember {
            relative_path: relative_path.to_string(),
            name: upload.name.clone(),
            size_bytes: upload.content.len() as u64,
            mime_type: upload.mime_type.clone(),
        };

        // Cheap pre-checks before the artifact write. The registry re-checks
        // folder shape and ownership authoritatively inside the upsert.
        match self.registry.get(folder_upload_id) {
            Some(record) => {
                if !record.is_folder {
                    return Err(ByshareError::Validation(format!(
                        "{folder_upload_id} is not a folder upload"
                    )));
                }
                if record.owner != upload.owner {
                    return Err(ByshareError::Validation(
                        "folder belongs to a different uploader".to_string(),
                    ));
                }
            }
            None => {
                if self.quota.is_limit_reached(&upload.owner) {
                    return Err(ByshareError::QuotaExceeded {
                        limit: self.quota.daily_limit(),
                    });
                }
            }
        }

        // Artifact write first, with bounded retries. A failure surfaces as
        // fatal for the whole folder; already-written members stay put.
        if let Err(e) = self
            .put_with_retry(folder_upload_id, Some(relative_path), &upload.content)
            .await
        {
            self.progress
                .publish_terminal(folder_upload_id, UploadStatus::Error);
            return Err(e);
        }

        let mut template = self.build_record(folder_upload_id, &upload, true)?;
        template.name = folder_root_name(relative_path).unwrap_or_else(|| upload.name.clone());
        template.mime_type = "application/x-directory".to_string();
        template.size_bytes = 0;

        let record = self
            .registry
            .upsert_folder_member(folder_upload_id, member, template)?;

        tracing::info!(
            id = %folder_upload_id,
            members = record.members.len(),
            "Folder member uploaded"
        );
        Ok(record)
    }

    /// Record a folder upload progress tick, and on completion
    /// (`current >= total`) increment quota exactly once and emit the
    /// terminal ready event.
    ///
    /// The completion transition lives on the registry record, so repeated
    /// or replayed reports (including after a restart) charge nothing.
    pub fn record_folder_progress(&self, folder_upload_id: &str, current: u32, total: u32) {
        self.progress
            .publish_progress(folder_upload_id, current, total);

        if current < total {
            return;
        }

        match self.registry.complete_folder(folder_upload_id) {
            Ok(Some(record)) => {
                self.quota.increment(&record.owner);
                self.progress
                    .publish_terminal(folder_upload_id, UploadStatus::Ready);
                tracing::info!(id = %folder_upload_id, "Folder upload complete");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    id = %folder_upload_id,
                    "Failed to record folder completion: {}",
                    e
                );
            }
        }
    }

    /// Fetch a record for a metadata read (lazy expiry applies).
    pub fn metadata(&self, id: &str) -> Result<FileRecord> {
        self.gate.metadata(id)
    }

    /// Side-effect-free password probe.
    pub fn verify_password(&self, id: &str, candidate: &str) -> Result<bool> {
        self.gate.verify_password(id, candidate)
    }

    /// Download content through the access gate. Folders are zipped on
    /// demand from their members.
    pub fn download(
        &self,
        id: &str,
        password: Option<&str>,
        identity: Option<&str>,
    ) -> Result<Download> {
        let record = self.gate.authorize_content(id, password, identity)?;

        if record.is_folder {
            let bytes = self.build_folder_archive(&record)?;
            let file_name = format!("{}.zip", record.name);
            return Ok(Download {
                record,
                bytes,
                content_type: "application/zip".to_string(),
                file_name,
            });
        }

        let bytes = self.store.get(id, None)?;
        let content_type = if record.mime_type.is_empty() {
            mime_guess::from_path(&record.name)
                .first_or_octet_stream()
                .to_string()
        } else {
            record.mime_type.clone()
        };
        let file_name = record.name.clone();

        Ok(Download {
            record,
            bytes,
            content_type,
            file_name,
        })
    }

    /// Update visibility (propagates to history).
    pub fn update_visibility(&self, id: &str, visibility: Visibility) -> Result<bool> {
        self.registry.update_visibility(id, visibility)
    }

    /// Update expiry, clamped to at most one year out (propagates to
    /// history).
    pub fn update_expiry(&self, id: &str, expires_at: Option<DateTime<Utc>>) -> Result<bool> {
        let clamped = expires_at.map(|at| clamp_expiry(at, Utc::now()));
        self.registry.update_expiry(id, clamped)
    }

    /// Delete a record, its history entry, and its artifacts.
    ///
    /// Idempotent: returns `false` when the id is already gone. The artifact
    /// removal is best-effort; an already-missing payload is not an error.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let Some(record) = self.registry.delete(id)? else {
            return Ok(false);
        };

        if let Err(e) = self.store.delete(&record.id) {
            tracing::warn!(id = %record.id, "Failed to delete artifact: {}", e);
        }

        tracing::info!(id = %record.id, "File deleted");
        Ok(true)
    }

    /// Append a moderation report.
    pub fn report(&self, id: &str, reason: impl Into<String>) -> Result<bool> {
        self.registry.report(id, reason)
    }

    /// Upload history for an owner, newest first.
    pub fn history_for(&self, owner: &str) -> Vec<HistoryEntry> {
        self.registry.history_for(owner)
    }

    /// Admin listing of all records.
    pub fn list_all(&self) -> Vec<FileRecord> {
        self.registry.list_all()
    }

    /// Total bytes across all records.
    pub fn total_storage_bytes(&self) -> u64 {
        self.registry.total_storage_bytes()
    }

    fn validate(&self, upload: &NewUpload) -> Result<()> {
        if upload.name.is_empty() {
            return Err(ByshareError::Validation("missing filename".to_string()));
        }
        if upload.name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(ByshareError::Validation(format!(
                "filename longer than {MAX_FILENAME_LENGTH} characters"
            )));
        }
        if upload.content.len() as u64 > self.max_upload_size {
            return Err(ByshareError::PayloadTooLarge {
                max: self.max_upload_size,
            });
        }
        Ok(())
    }

    fn build_record(&self, id: &str, upload: &NewUpload, is_folder: bool) -> Result<FileRecord> {
        let now = Utc::now();
        let password_hash = match &upload.options.password {
            Some(p) if !p.is_empty() => Some(hash_password(p)?),
            _ => None,
        };

        Ok(FileRecord {
            id: id.to_string(),
            name: upload.name.clone(),
            size_bytes: upload.content.len() as u64,
            mime_type: upload.mime_type.clone(),
            password_hash,
            expires_at: upload.options.expires_at.map(|at| clamp_expiry(at, now)),
            created_at: now,
            owner: upload.owner.clone(),
            visibility: upload.options.visibility,
            report_count: 0,
            report_reasons: Vec::new(),
            is_folder,
            completed: false,
            members: Vec::new(),
        })
    }

    /// Write an artifact with bounded retries (fixed backoff) before
    /// surfacing a fatal storage error.
    async fn put_with_retry(
        &self,
        id: &str,
        relative_path: Option<&str>,
        bytes: &[u8],
    ) -> Result<()> {
        let mut last_err = None;

        for attempt in 1..=STORE_RETRY_ATTEMPTS {
            match self.store.put(id, relative_path, bytes) {
                Ok(()) => return Ok(()),
                // Bad keys never get better; don't burn retries on them.
                Err(e @ ByshareError::Validation(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        id = %id,
                        attempt,
                        "Artifact write failed: {}",
                        e
                    );
                    last_err = Some(e);
                    if attempt < STORE_RETRY_ATTEMPTS {
                        tokio::time::sleep(STORE_RETRY_BACKOFF).await;
                    }
                }
            }
        }

        Err(match last_err {
            Some(ByshareError::Io(e)) => ByshareError::Storage(e.to_string()),
            Some(e) => e,
            None => ByshareError::Storage("artifact write failed".to_string()),
        })
    }

    /// Build a zip archive from a folder's members.
    fn build_folder_archive(&self, record: &FileRecord) -> Result<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for member in &record.members {
            let bytes = self.store.get(&record.id, Some(&member.relative_path))?;
            writer
                .start_file(member.relative_path.as_str(), options)
                .map_err(|e| ByshareError::Storage(format!("zip write failed: {e}")))?;
            writer.write_all(&bytes)?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| ByshareError::Storage(format!("zip finalize failed: {e}")))?;
        Ok(cursor.into_inner())
    }
}

/// First path segment of a member path, used as the folder's display name.
fn folder_root_name(relative_path: &str) -> Option<String> {
    relative_path
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
