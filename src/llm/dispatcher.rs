use std::sync::Arc;

use futures::FutureExt;
use tracing::info;

use crate::context::build_user_message;
use crate::llm::provider::LLMAdapter;
use crate::types::{AppResult, LLMMessage, LLMRequest};
use crate::utils::retry::{with_retry, RetryPolicy};

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Analyze the provided data and answer questions.";
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1000;
pub const TOP_P: f32 = 1.0;

/// Sends one question plus its data context to the chat-completion service.
#[derive(Clone)]
pub struct QueryDispatcher {
    adapter: Arc<dyn LLMAdapter>,
    model: String,
    retry: RetryPolicy,
}

impl QueryDispatcher {
    pub fn new(adapter: Arc<dyn LLMAdapter>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            model: model.into(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build_request(&self, context: &str, question: &str) -> LLMRequest {
        LLMRequest {
            model: self.model.clone(),
            messages: vec![
                LLMMessage::system(SYSTEM_PROMPT),
                LLMMessage::user(build_user_message(context, question)),
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }

    /// Returns the text of the first answer. Errors are `RemoteServiceError`.
    pub async fn send_chat_request(&self, context: &str, question: &str) -> AppResult<String> {
        let request = Arc::new(self.build_request(context, question));
        let adapter = self.adapter.clone();

        info!(
            model = %self.model,
            context_chars = context.chars().count(),
            "Dispatching question to chat-completion service"
        );
        let response = with_retry(
            move || {
                let adapter = adapter.clone();
                let request = request.clone();
                async move { adapter.create_chat_completion(&request).await }.boxed()
            },
            self.retry,
        )
        .await?;

        Ok(response.content)
    }
}
