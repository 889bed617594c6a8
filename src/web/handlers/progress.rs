//! Folder upload progress handlers.
//!
//! Progress flows client to server via POST reports and server to client
//! via a WebSocket event stream keyed by the folder upload id.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::file::UploadEvent;
use crate::web::dto::{FolderProgressRequest, SuccessResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/upload/folder/progress - Report folder upload progress.
///
/// When `current` reaches `total` the folder is complete: quota is charged
/// once and subscribers receive the terminal ready event.
pub async fn report_folder_progress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FolderProgressRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if req.total == 0 {
        return Err(ApiError::unprocessable("total must be at least 1"));
    }

    state
        .service
        .record_folder_progress(&req.folder_upload_id, req.current, req.total);

    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/upload/:id/progress - Subscribe to upload progress events.
pub async fn progress_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<String>,
) -> Response {
    tracing::debug!(id = %upload_id, "Progress subscription");
    ws.on_upgrade(move |socket| stream_events(socket, state, upload_id))
}

/// Forward broker events to the socket until the stream ends.
async fn stream_events(mut socket: WebSocket, state: Arc<AppState>, upload_id: String) {
    let mut rx = state.service.progress().subscribe(&upload_id);

    loop {
        match rx.recv().await {
            Ok(event) => {
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!("Failed to serialize progress event: {}", e);
                        break;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    // Client went away.
                    break;
                }
                if matches!(event, UploadEvent::Status { .. }) {
                    break;
                }
            }
            // Slow subscriber dropped some ticks; keep the stream alive.
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(id = %upload_id, skipped, "Progress subscriber lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    drop(rx);
    state.service.progress().release(&upload_id);
    let _ = socket.send(Message::Close(None)).await;
}
