//! Admin handlers for the Web API.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::web::dto::{
    AdminFileEntry, AdminLoginRequest, AdminLoginResponse, StorageUsageResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/admin/login - Check admin credentials.
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    if req.username != state.admin.username || req.password != state.admin.password {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    tracing::info!("Admin login");
    Ok(Json(AdminLoginResponse { valid: true }))
}

/// GET /api/files - List every record, for the admin dashboard.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminFileEntry>>, ApiError> {
    let entries = state
        .service
        .list_all()
        .iter()
        .map(AdminFileEntry::from)
        .collect();

    Ok(Json(entries))
}

/// GET /api/storage/usage - Total bytes across all records.
pub async fn storage_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StorageUsageResponse>, ApiError> {
    Ok(Json(StorageUsageResponse {
        usage: state.service.total_storage_bytes(),
    }))
}
