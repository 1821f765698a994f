use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::analysis::{build_chart, ChartSpec};
use crate::models::{AppState, ChartResponse, DataPreview, PreviewResponse, SessionResponse};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}/preview", get(get_preview))
        .route("/api/sessions/{id}/chart", post(post_chart))
        .with_state(state)
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.sessions.create().await;
    info!(session_id = %session.id, "Session created");
    Json(SessionResponse::from(&session))
}

async fn get_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PreviewResponse>> {
    let session = state.sessions.get(id).await?;
    Ok(Json(PreviewResponse {
        session_id: session.id,
        file_name: session.file_name.clone(),
        preview: session.data.as_deref().map(DataPreview::from_data),
        chart: session.chart.clone(),
    }))
}

/// POST /api/sessions/{id}/chart - recompute the chart for the session's table
async fn post_chart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(spec): Json<ChartSpec>,
) -> AppResult<Json<ChartResponse>> {
    let session = state.sessions.get(id).await?;
    let table = session
        .data
        .as_deref()
        .and_then(|data| data.as_table())
        .ok_or_else(|| {
            AppError::InvalidRequest(
                "Please upload a valid CSV or XLSX file for visualization.".to_string(),
            )
        })?;

    let output = build_chart(table, &spec)?;
    state.sessions.set_chart(id, spec).await?;
    info!(session_id = %id, title = %output.chart.title, "Chart request served");

    Ok(Json(ChartResponse {
        session_id: id,
        output,
    }))
}
