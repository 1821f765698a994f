// Shared LLM request/response types and the application error taxonomy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported file format: '{0}'. Please upload a CSV, XLSX, or PDF file.")]
    UnsupportedFormat(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("The table doesn't have enough numeric columns for plotting (found {found}, need 2)")]
    InsufficientNumericColumns { found: usize },

    #[error("Invalid column: '{0}' is not a numeric column of the uploaded table")]
    InvalidColumn(String),

    #[error("Remote service error: {0}")]
    RemoteServiceError(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable name used in JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::MalformedInput(_) => "MalformedInput",
            AppError::InsufficientNumericColumns { .. } => "InsufficientNumericColumns",
            AppError::InvalidColumn(_) => "InvalidColumn",
            AppError::RemoteServiceError(_) => "RemoteServiceError",
            AppError::MissingCredential(_) => "MissingCredential",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidRequest(_) => "InvalidRequest",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MalformedInput(_) | AppError::InsufficientNumericColumns { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidColumn(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RemoteServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingCredential(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        (
            status,
            Json(serde_json::json!({
                "error": self.kind(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
