//! File handlers for the Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::file::{NewUpload, ShareOptions, Visibility};
use crate::web::dto::{
    AccessQuery, FileMetadataResponse, ReportRequest, SuccessResponse, UpdateExpiryRequest,
    UpdateVisibilityRequest, UploadResponse, VerifyPasswordRequest, VerifyPasswordResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// This function sanitizes the filename to prevent header injection attacks
/// and uses RFC 5987 encoding for non-ASCII filenames.
///
/// # Security
///
/// The function:
/// - Removes control characters (including CR, LF which could cause header injection)
/// - Escapes double quotes and backslashes
/// - Uses RFC 5987 filename* parameter for proper Unicode support
fn content_disposition_header(filename: &str) -> String {
    // Sanitize filename for the basic filename parameter (ASCII fallback)
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control()) // Remove control characters (CR, LF, etc.)
        .map(|c| match c {
            '"' => '_',  // Replace double quotes
            '\\' => '_', // Replace backslashes
            _ => c,
        })
        .collect();

    // For ASCII-only filenames, use simple format
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    // Use RFC 5987 encoding for non-ASCII or special characters
    // filename* parameter with UTF-8 encoding
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// Accumulated fields of an upload form.
#[derive(Debug, Default)]
struct UploadForm {
    filename: Option<String>,
    mime_type: Option<String>,
    content: Option<Vec<u8>>,
    password: Option<String>,
    expiry_date: Option<String>,
    visibility: Option<String>,
    user_id: Option<String>,
    folder_upload_id: Option<String>,
    folder_path: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                form.filename = field.file_name().map(|s| s.to_string());
                form.mime_type = field.content_type().map(|s| s.to_string());
                form.content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to read file content: {}", e);
                            ApiError::bad_request("Failed to read file")
                        })?
                        .to_vec(),
                );
            }
            "password" => form.password = Some(read_text(field).await?),
            "expiryDate" => form.expiry_date = Some(read_text(field).await?),
            "visibility" => form.visibility = Some(read_text(field).await?),
            "userId" => form.user_id = Some(read_text(field).await?),
            "folderUploadId" => form.folder_upload_id = Some(read_text(field).await?),
            "folderPath" => form.folder_path = Some(read_text(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })
}

fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| ApiError::unprocessable("expiryDate must be an RFC 3339 timestamp"))
}

fn parse_visibility(raw: &str) -> Result<Visibility, ApiError> {
    Visibility::parse(raw)
        .ok_or_else(|| ApiError::unprocessable("visibility must be \"public\" or \"private\""))
}

/// POST /api/upload - Upload a file or one folder member.
///
/// Request body: multipart/form-data with a "file" field and optional
/// "password", "expiryDate", "visibility", and "userId" fields. Folder
/// members additionally carry "folderUploadId" and "folderPath".
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;

    let filename = form
        .filename
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let content = form
        .content
        .ok_or_else(|| ApiError::bad_request("No file content"))?;

    let options = ShareOptions {
        password: form.password.filter(|p| !p.is_empty()),
        expires_at: match form.expiry_date.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_expiry(raw)?),
            None => None,
        },
        visibility: match form.visibility.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_visibility(raw)?,
            None => Visibility::default(),
        },
    };

    let upload = NewUpload {
        name: filename.clone(),
        mime_type: form
            .mime_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        content,
        owner: form.user_id.unwrap_or_else(|| "anonymous".to_string()),
        options,
    };

    let record = match form.folder_upload_id {
        Some(folder_id) => {
            let relative_path = form.folder_path.unwrap_or_else(|| filename.clone());
            state
                .service
                .upload_folder_member(&folder_id, &relative_path, upload)
                .await?
        }
        None => state.service.upload(upload).await?,
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse::new(&record, &state.base_url)),
    ))
}

/// GET /api/files/:id/metadata - Get share page metadata.
pub async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FileMetadataResponse>, ApiError> {
    let record = state.service.metadata(&id)?;
    Ok(Json(FileMetadataResponse::from(&record)))
}

/// GET /api/files/:id/download - Download content.
///
/// Password-gated files take the password as a query parameter; private
/// files require the owner's userId. Folders are served as zip archives.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> Result<Response<Body>, ApiError> {
    let download =
        state
            .service
            .download(&id, query.password.as_deref(), query.user_id.as_deref())?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, download.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file_name),
        )
        .header(header::CONTENT_LENGTH, download.bytes.len())
        .body(Body::from(download.bytes))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// POST /api/files/:id/verify-password - Probe an access password.
pub async fn verify_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VerifyPasswordRequest>,
) -> Result<Json<VerifyPasswordResponse>, ApiError> {
    let is_valid = state.service.verify_password(&id, &req.password)?;
    Ok(Json(VerifyPasswordResponse { is_valid }))
}

/// Sharing settings belong to the uploader; everyone else gets a 403.
fn require_owner(state: &AppState, id: &str, user_id: Option<&str>) -> Result<(), ApiError> {
    let record = state.service.metadata(id)?;
    if user_id != Some(record.owner.as_str()) {
        return Err(ApiError::forbidden(
            "Only the uploader can change sharing settings",
        ));
    }
    Ok(())
}

/// PUT /api/files/:id/visibility - Change visibility.
pub async fn update_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateVisibilityRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let visibility = parse_visibility(&req.visibility)?;
    require_owner(&state, &id, req.user_id.as_deref())?;

    if !state.service.update_visibility(&id, visibility)? {
        return Err(ApiError::not_found("File not found"));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// PUT /api/files/:id/expiry - Change or clear the expiry date.
pub async fn update_expiry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateExpiryRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let expires_at = match req.expiry_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_expiry(raw)?),
        None => None,
    };
    require_owner(&state, &id, req.user_id.as_deref())?;

    if !state.service.update_expiry(&id, expires_at)? {
        return Err(ApiError::not_found("File not found"));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/files/:id - Delete an upload.
///
/// Only the owner may delete; the requester identifies via the userId
/// query parameter.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let record = state.service.metadata(&id)?;

    if query.user_id.as_deref() != Some(record.owner.as_str()) {
        return Err(ApiError::forbidden("Only the uploader can delete a file"));
    }

    if !state.service.delete(&id)? {
        return Err(ApiError::not_found("File not found"));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/files/:id/report - File a moderation report.
pub async fn report_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if req.reason.trim().is_empty() {
        return Err(ApiError::unprocessable("A report reason is required"));
    }

    if !state.service.report(&id, req.reason.trim())? {
        return Err(ApiError::not_found("File not found"));
    }
    Ok(Json(SuccessResponse::ok()))
}
