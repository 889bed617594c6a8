//! User handlers for the Web API.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::file::HistoryEntry;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/users/:userId/uploads - Upload history, newest first.
///
/// An unknown user id yields an empty list, not an error; history is
/// created lazily on first upload.
pub async fn get_upload_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    Ok(Json(state.service.history_for(&user_id)))
}
