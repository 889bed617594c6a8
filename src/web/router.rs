//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    admin_login, delete_file, download_file, get_metadata, get_upload_history, list_files,
    progress_ws_handler, report_file, report_folder_progress, storage_usage, update_expiry,
    update_visibility, upload_file, verify_password, AppState,
};
use super::middleware::create_cors_layer;

/// Create the main API router.
///
/// The body limit leaves headroom over the configured max upload size so
/// multipart framing never trips the transport limit before the size check.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let max_body = app_state.service.max_upload_size() as usize + 1024 * 1024;

    let api_routes = Router::new()
        .route("/upload", post(upload_file))
        .route("/upload/folder/progress", post(report_folder_progress))
        .route("/upload/:id/progress", get(progress_ws_handler))
        .route("/files", get(list_files))
        .route("/files/:id", delete(delete_file))
        .route("/files/:id/metadata", get(get_metadata))
        .route("/files/:id/download", get(download_file))
        .route("/files/:id/verify-password", post(verify_password))
        .route("/files/:id/visibility", put(update_visibility))
        .route("/files/:id/expiry", put(update_expiry))
        .route("/files/:id/report", post(report_file))
        .route("/users/:user_id/uploads", get(get_upload_history))
        .route("/storage/usage", get(storage_usage))
        .route("/admin/login", post(admin_login));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
