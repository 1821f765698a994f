// In-process adapter that records requests and replays a canned outcome

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

pub struct MockLLMAdapter {
    outcome: Result<String, String>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl MockLLMAdapter {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            outcome: Ok(answer.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LLMAdapter for MockLLMAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }

        match &self.outcome {
            Ok(answer) => Ok(LLMResponse {
                content: answer.clone(),
                finish_reason: Some("stop".to_string()),
                usage: None,
            }),
            Err(message) => Err(AppError::RemoteServiceError(message.clone())),
        }
    }
}
