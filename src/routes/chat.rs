use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::context::format_context;
use crate::models::{AppState, ChatRequest, ChatResponse};
use crate::types::AppResult;

pub const DEFAULT_QUESTION: &str = "What insights can you provide from the uploaded data?";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .with_state(state)
}

/// POST /api/chat - answer a question, using the session's file as context when there is one
pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let question = if request.question.trim().is_empty() {
        DEFAULT_QUESTION.to_string()
    } else {
        request.question
    };

    let data = match request.session_id {
        Some(id) => state.sessions.get(id).await?.data,
        None => None,
    };
    let context = format_context(data.as_deref(), &state.config.context);
    info!(
        session_id = ?request.session_id,
        has_data = data.is_some(),
        "Received chat request"
    );

    let answer = state
        .dispatcher
        .send_chat_request(&context, &question)
        .await?;

    Ok(Json(ChatResponse {
        answer,
        session_id: request.session_id,
        context_chars: context.chars().count(),
    }))
}
