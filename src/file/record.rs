//! Data model for the file registry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Visibility of a shared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone with the link may read.
    Public,
    /// Only the owning identity may fetch content.
    Private,
}

impl Visibility {
    /// Parse a wire value (`public` / `private`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// A constituent file of a folder upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderMember {
    /// Path of the member relative to the folder root.
    pub relative_path: String,
    /// Original filename.
    pub name: String,
    /// Member size in bytes.
    pub size_bytes: u64,
    /// MIME type.
    pub mime_type: String,
}

/// The authoritative record of an uploaded file or folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Opaque, globally unique, URL-safe identifier. Immutable.
    pub id: String,
    /// Original filename, or the folder root name.
    pub name: String,
    /// Total size in bytes; for folders, the sum of member sizes.
    pub size_bytes: u64,
    /// MIME type.
    pub mime_type: String,
    /// Argon2id PHC hash of the access password; `None` means no gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Expiry timestamp; `None` means never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Uploader's anonymous user id or network address.
    pub owner: String,
    /// Public or private visibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Number of moderation reports received.
    #[serde(default)]
    pub report_count: u32,
    /// Append-only moderation trail; always `report_count` entries long.
    #[serde(default)]
    pub report_reasons: Vec<String>,
    /// True when this record is a folder upload.
    #[serde(default)]
    pub is_folder: bool,
    /// True once a folder has reported completion and its quota unit was
    /// charged. Always false for single files.
    #[serde(default)]
    pub completed: bool,
    /// Folder members; empty for single files.
    #[serde(default)]
    pub members: Vec<FolderMember>,
}

impl FileRecord {
    /// Whether the record has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }

    /// Whether a password gate is set.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Clamp a requested expiry to at most one year from `now`.
///
/// Applied at write time only; stored values are not re-validated later.
pub fn clamp_expiry(requested: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let ceiling = now + Duration::days(super::MAX_EXPIRY_DAYS);
    requested.min(ceiling)
}

/// Denormalized per-owner projection of a [`FileRecord`].
///
/// The registry is the source of truth; history entries are advisory and can
/// be rebuilt from the records at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// File id.
    pub id: String,
    /// Original filename.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub file_type: String,
    /// Upload timestamp.
    pub upload_date: DateTime<Utc>,
    /// Expiry timestamp, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Whether a password gate is set (never the hash itself).
    pub has_password: bool,
    /// Visibility.
    pub visibility: Visibility,
    /// Whether the record is a folder.
    #[serde(default)]
    pub is_folder: bool,
}

impl HistoryEntry {
    /// Project a registry record into its history form.
    pub fn from_record(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            file_name: record.name.clone(),
            file_size: record.size_bytes,
            file_type: record.mime_type.clone(),
            upload_date: record.created_at,
            expiry_date: record.expires_at,
            has_password: record.has_password(),
            visibility: record.visibility,
            is_folder: record.is_folder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FileRecord {
        FileRecord {
            id: "abc123".to_string(),
            name: "report.pdf".to_string(),
            size_bytes: 2048,
            mime_type: "application/pdf".to_string(),
            password_hash: None,
            expires_at: None,
            created_at: Utc::now(),
            owner: "user-1".to_string(),
            visibility: Visibility::Public,
            report_count: 0,
            report_reasons: Vec::new(),
            is_folder: false,
            completed: false,
            members: Vec::new(),
        }
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!(Visibility::parse("public"), Some(Visibility::Public));
        assert_eq!(Visibility::parse("private"), Some(Visibility::Private));
        assert_eq!(Visibility::parse("hidden"), None);
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let mut record = sample_record();
        assert!(!record.is_expired(now));

        record.expires_at = Some(now - Duration::hours(1));
        assert!(record.is_expired(now));

        record.expires_at = Some(now + Duration::hours(1));
        assert!(!record.is_expired(now));
    }

    #[test]
    fn test_clamp_expiry_within_limit() {
        let now = Utc::now();
        let requested = now + Duration::days(30);
        assert_eq!(clamp_expiry(requested, now), requested);
    }

    #[test]
    fn test_clamp_expiry_beyond_limit() {
        let now = Utc::now();
        let requested = now + Duration::days(365 * 2);
        assert_eq!(clamp_expiry(requested, now), now + Duration::days(365));
    }

    #[test]
    fn test_history_entry_projection() {
        let mut record = sample_record();
        record.password_hash = Some("$argon2id$...".to_string());

        let entry = HistoryEntry::from_record(&record);
        assert_eq!(entry.id, record.id);
        assert_eq!(entry.file_name, "report.pdf");
        assert_eq!(entry.file_size, 2048);
        assert!(entry.has_password);
        assert!(!entry.is_folder);
    }

    #[test]
    fn test_record_snapshot_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        // Wire names mirror the original snapshot layout.
        assert!(json.contains("\"sizeBytes\""));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("passwordHash"));

        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.size_bytes, record.size_bytes);
    }
}
