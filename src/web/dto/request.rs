//! Request DTOs for the Web API.

use serde::Deserialize;

/// Password verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    /// Candidate password.
    pub password: String,
}

/// Visibility update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisibilityRequest {
    /// New visibility, "public" or "private".
    pub visibility: String,
    /// Requester identity; must match the owner.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Expiry update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpiryRequest {
    /// New expiry as an RFC 3339 timestamp; null clears the expiry.
    #[serde(default)]
    pub expiry_date: Option<String>,
    /// Requester identity; must match the owner.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Moderation report request.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Reason given by the reporter.
    pub reason: String,
}

/// Folder upload progress report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderProgressRequest {
    /// Client-minted folder upload id.
    pub folder_upload_id: String,
    /// Members uploaded so far.
    pub current: u32,
    /// Total members expected.
    pub total: u32,
}

/// Admin login request.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
}

/// Query parameters on content and delete endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessQuery {
    /// Access password for gated files.
    #[serde(default)]
    pub password: Option<String>,
    /// Requester identity, for private files and owner actions.
    #[serde(default)]
    pub user_id: Option<String>,
}
