use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::ingest::{load_data, UploadedFile};
use crate::models::{AppState, DataPreview, UploadResponse};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    let limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/api/files", post(upload_file))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// POST /api/files - multipart form with a `file` part and an optional `session_id` part
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut session_id: Option<Uuid> = None;
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "session_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("session_id: {}", e)))?;
                if !raw.trim().is_empty() {
                    session_id = Some(raw.trim().parse().map_err(|_| {
                        AppError::InvalidRequest(format!("'{}' is not a session id", raw.trim()))
                    })?);
                }
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidRequest("file part has no filename".to_string()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("file: {}", e)))?;
                upload = Some(UploadedFile::new(filename, bytes));
            }
            _ => {}
        }
    }

    let file = upload.ok_or_else(|| AppError::InvalidRequest("missing 'file' field".to_string()))?;
    let session = state.sessions.get_or_create(session_id).await?;
    info!(session_id = %session.id, filename = %file.filename, size = file.bytes.len(), "File upload received");

    match load_data(&file) {
        Ok(data) => {
            let preview = DataPreview::from_data(&data);
            state
                .sessions
                .set_data(session.id, file.filename.clone(), data)
                .await?;
            Ok(Json(UploadResponse {
                session_id: session.id,
                file_name: file.filename,
                preview,
            }))
        }
        Err(e) => {
            // a rejected file must not leave the previous one in place
            state.sessions.clear_data(session.id).await?;
            Err(e)
        }
    }
}
