//! Response DTOs for the Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::file::{FileRecord, Visibility};

/// Successful upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// File identifier.
    pub id: String,
    /// Original filename (for folders, the folder name).
    pub name: String,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// Absolute share URL.
    pub url: String,
}

impl UploadResponse {
    /// Build from a record and the configured base URL.
    pub fn new(record: &FileRecord, base_url: &str) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            size_bytes: record.size_bytes,
            url: format!("{}/f/{}", base_url.trim_end_matches('/'), record.id),
        }
    }
}

/// Public file metadata, as shown on a share page.
///
/// Never carries the password hash or the owner identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataResponse {
    /// File identifier.
    pub id: String,
    /// Filename or folder name.
    pub name: String,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// MIME type.
    pub mime_type: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether a password gate is set.
    pub has_password: bool,
    /// Public or private.
    pub visibility: Visibility,
    /// Whether this is a folder upload.
    pub is_folder: bool,
    /// Member count for folders, 0 for single files.
    pub member_count: usize,
}

impl From<&FileRecord> for FileMetadataResponse {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            size_bytes: record.size_bytes,
            mime_type: record.mime_type.clone(),
            created_at: record.created_at,
            expires_at: record.expires_at,
            has_password: record.has_password(),
            visibility: record.visibility,
            is_folder: record.is_folder,
            member_count: record.members.len(),
        }
    }
}

/// Password verification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPasswordResponse {
    /// Whether the candidate matched.
    pub is_valid: bool,
}

/// Generic success acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
}

impl SuccessResponse {
    /// The affirmative acknowledgement.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Admin credential check result.
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    /// Whether the credentials matched.
    pub valid: bool,
}

/// Aggregate storage usage, for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct StorageUsageResponse {
    /// Total bytes across all records.
    pub usage: u64,
}

/// One file in the admin listing. Includes moderation state and the owner,
/// which the public metadata endpoint omits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFileEntry {
    /// File identifier.
    pub id: String,
    /// Filename or folder name.
    pub name: String,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// MIME type.
    pub mime_type: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Uploader identity.
    pub owner: String,
    /// Public or private.
    pub visibility: Visibility,
    /// Whether a password gate is set.
    pub has_password: bool,
    /// Whether this is a folder upload.
    pub is_folder: bool,
    /// Number of moderation reports.
    pub report_count: u32,
    /// Reasons given by reporters.
    pub report_reasons: Vec<String>,
}

impl From<&FileRecord> for AdminFileEntry {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            size_bytes: record.size_bytes,
            mime_type: record.mime_type.clone(),
            created_at: record.created_at,
            expires_at: record.expires_at,
            owner: record.owner.clone(),
            visibility: record.visibility,
            has_password: record.has_password(),
            is_folder: record.is_folder,
            report_count: record.report_count,
            report_reasons: record.report_reasons.clone(),
        }
    }
}
