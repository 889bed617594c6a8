//! Access gate: the read-path rules for expiry, password, and visibility.
//!
//! Every read goes through the same sequence: look up the record, evict it
//! synchronously if expired (the caller only ever sees NotFound), then apply
//! the password and visibility gates. Eviction happens before any content is
//! released, so a client racing the expiry boundary never receives bytes.

use std::sync::Arc;

use chrono::Utc;

use super::password::verify_password;
use super::record::{FileRecord, Visibility};
use super::registry::FileRegistry;
use super::storage::ArtifactStore;
use crate::{ByshareError, Result};

/// Read-path gatekeeper over the registry and artifact store.
#[derive(Debug, Clone)]
pub struct AccessGate {
    registry: Arc<FileRegistry>,
    store: Arc<ArtifactStore>,
}

impl AccessGate {
    /// Create a gate over the given registry and store.
    pub fn new(registry: Arc<FileRegistry>, store: Arc<ArtifactStore>) -> Self {
        Self { registry, store }
    }

    /// Fetch a record for a metadata read.
    ///
    /// Applies the expiry check (with lazy eviction) only; redacted metadata
    /// is open so share pages can render the password prompt. The password
    /// hash itself is stripped at the DTO boundary.
    pub fn metadata(&self, id: &str) -> Result<FileRecord> {
        self.live_record(id)
    }

    /// Authorize a content read, returning the record on success.
    ///
    /// Sequence: lookup, lazy expiry eviction, password gate, then the
    /// private-visibility check (owner-only).
    pub fn authorize_content(
        &self,
        id: &str,
        password: Option<&str>,
        identity: Option<&str>,
    ) -> Result<FileRecord> {
        let record = self.live_record(id)?;

        if let Some(hash) = &record.password_hash {
            let candidate = password.ok_or(ByshareError::WrongPassword)?;
            if !verify_password(hash, candidate) {
                return Err(ByshareError::WrongPassword);
            }
        }

        if record.visibility == Visibility::Private && identity != Some(record.owner.as_str()) {
            // Owner-only content reads; a non-owner is told the file does not
            // exist rather than that it is private.
            return Err(ByshareError::NotFound("file".to_string()));
        }

        Ok(record)
    }

    /// Side-effect-free password probe.
    ///
    /// Applies the same expiry check first: an expired file reports NotFound,
    /// not a password prompt. A file without a password gate verifies false.
    pub fn verify_password(&self, id: &str, candidate: &str) -> Result<bool> {
        let record = self.live_record(id)?;

        Ok(match &record.password_hash {
            Some(hash) => verify_password(hash, candidate),
            None => false,
        })
    }

    /// Look up a record, evicting it if expired.
    fn live_record(&self, id: &str) -> Result<FileRecord> {
        let record = self
            .registry
            .get(id)
            .ok_or_else(|| ByshareError::NotFound("file".to_string()))?;

        if record.is_expired(Utc::now()) {
            self.evict(&record);
            return Err(ByshareError::NotFound("file".to_string()));
        }

        Ok(record)
    }

    /// Delete an expired record and its artifacts. Best-effort on the
    /// artifact side; the registry deletion is what matters for correctness.
    fn evict(&self, record: &FileRecord) {
        tracing::info!(id = %record.id, "Evicting expired file");

        if let Err(e) = self.registry.delete(&record.id) {
            tracing::error!(id = %record.id, "Failed to evict expired record: {}", e);
        }
        if let Err(e) = self.store.delete(&record.id) {
            tracing::warn!(id = %record.id, "Failed to delete expired artifact: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::password::hash_password;
    use chrono::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, AccessGate, Arc<FileRegistry>, Arc<ArtifactStore>) {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(FileRegistry::in_memory());
        let store = Arc::new(ArtifactStore::new(dir.path()).unwrap());
        let gate = AccessGate::new(registry.clone(), store.clone());
        (dir, gate, registry, store)
    }

    fn record(id: &str) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            name: "doc.txt".to_string(),
            size_bytes: 4,
            mime_type: "text/plain".to_string(),
            password_hash: None,
            expires_at: None,
            created_at: Utc::now(),
            owner: "alice".to_string(),
            visibility: Visibility::Public,
            report_count: 0,
            report_reasons: Vec::new(),
            is_folder: false,
            completed: false,
            members: Vec::new(),
        }
    }

    #[test]
    fn test_metadata_unknown_id() {
        let (_dir, gate, _registry, _store) = setup();
        assert!(matches!(
            gate.metadata("ghost"),
            Err(ByshareError::NotFound(_))
        ));
    }

    #[test]
    fn test_metadata_open_file() {
        let (_dir, gate, registry, _store) = setup();
        registry.insert(record("abc123")).unwrap();

        let found = gate.metadata("abc123").unwrap();
        assert_eq!(found.name, "doc.txt");
    }

    #[test]
    fn test_expired_record_is_evicted_synchronously() {
        let (_dir, gate, registry, store) = setup();
        let mut rec = record("abc123");
        rec.expires_at = Some(Utc::now() - Duration::minutes(1));
        store.put("abc123", None, b"data").unwrap();
        registry.insert(rec).unwrap();

        // First read evicts.
        assert!(matches!(
            gate.metadata("abc123"),
            Err(ByshareError::NotFound(_))
        ));
        // The record is gone, not merely hidden.
        assert!(registry.get("abc123").is_none());
        assert!(!store.exists("abc123", None));
        // A second read still reports NotFound.
        assert!(matches!(
            gate.metadata("abc123"),
            Err(ByshareError::NotFound(_))
        ));
    }

    #[test]
    fn test_password_gate_on_content() {
        let (_dir, gate, registry, _store) = setup();
        let mut rec = record("abc123");
        rec.password_hash = Some(hash_password("open sesame").unwrap());
        registry.insert(rec).unwrap();

        // No password supplied.
        assert!(matches!(
            gate.authorize_content("abc123", None, None),
            Err(ByshareError::WrongPassword)
        ));
        // Wrong password.
        assert!(matches!(
            gate.authorize_content("abc123", Some("guess"), None),
            Err(ByshareError::WrongPassword)
        ));
        // Correct password.
        assert!(gate
            .authorize_content("abc123", Some("open sesame"), None)
            .is_ok());
    }

    #[test]
    fn test_private_file_owner_only() {
        let (_dir, gate, registry, _store) = setup();
        let mut rec = record("abc123");
        rec.visibility = Visibility::Private;
        registry.insert(rec).unwrap();

        assert!(matches!(
            gate.authorize_content("abc123", None, None),
            Err(ByshareError::NotFound(_))
        ));
        assert!(matches!(
            gate.authorize_content("abc123", None, Some("mallory")),
            Err(ByshareError::NotFound(_))
        ));
        assert!(gate.authorize_content("abc123", None, Some("alice")).is_ok());

        // Metadata stays readable for the share page.
        assert!(gate.metadata("abc123").is_ok());
    }

    #[test]
    fn test_verify_password() {
        let (_dir, gate, registry, _store) = setup();
        let mut rec = record("abc123");
        rec.password_hash = Some(hash_password("hunter2").unwrap());
        registry.insert(rec).unwrap();

        assert!(gate.verify_password("abc123", "hunter2").unwrap());
        assert!(!gate.verify_password("abc123", "wrong").unwrap());
    }

    #[test]
    fn test_verify_password_without_gate_is_false() {
        let (_dir, gate, registry, _store) = setup();
        registry.insert(record("abc123")).unwrap();

        assert!(!gate.verify_password("abc123", "anything").unwrap());
    }

    #[test]
    fn test_verify_password_expired_reports_not_found() {
        let (_dir, gate, registry, _store) = setup();
        let mut rec = record("abc123");
        rec.password_hash = Some(hash_password("pw").unwrap());
        rec.expires_at = Some(Utc::now() - Duration::minutes(1));
        registry.insert(rec).unwrap();

        assert!(matches!(
            gate.verify_password("abc123", "pw"),
            Err(ByshareError::NotFound(_))
        ));
        assert!(registry.get("abc123").is_none());
    }
}
