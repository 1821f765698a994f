use async_trait::async_trait;
use crate::types::{LLMRequest, LLMResponse, AppResult};

/// A chat-completion backend. Implementations map transport and service
/// failures to `AppError::RemoteServiceError`.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}
