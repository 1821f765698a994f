// Adapter for OpenAI-compatible chat-completion endpoints
// (GitHub Models / Azure AI inference: POST {endpoint}/chat/completions)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LLMConfig;
use crate::credentials::CredentialSource;
use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, TokenUsage};

pub struct InferenceAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [LLMMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl InferenceAdapter {
    /// `timeout` of `None` leaves the request unbounded
    pub fn new(endpoint: &str, api_key: &str, timeout: Option<Duration>) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Build from configuration, taking the bearer token from `source`
    pub fn from_source(config: &LLMConfig, source: &dyn CredentialSource) -> AppResult<Self> {
        let token = source.load_credential()?;
        Self::new(&config.endpoint, &token, config.timeout())
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl LLMAdapter for InferenceAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        };

        debug!(model = %request.model, url = %self.url(), "Sending chat completion request");
        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::RemoteServiceError(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(AppError::RemoteServiceError(format!(
                    "API error ({}): {} (code: {:?})",
                    status, error_response.error.message, error_response.error.code
                )));
            }

            return Err(AppError::RemoteServiceError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::RemoteServiceError(format!("failed to parse response: {}", e)))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::RemoteServiceError("service returned no choices".to_string()))?;

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason,
            usage: chat_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{EnvCredentialSource, StaticCredential};
    use mockito::Matcher;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "gpt-4o".to_string(),
            messages: vec![
                LLMMessage::system("You are a helpful assistant."),
                LLMMessage::user("User question: hi"),
            ],
            max_tokens: 1000,
            temperature: 0.7,
            top_p: 1.0,
        }
    }

    #[test]
    fn test_url_joins_endpoint() {
        let adapter = InferenceAdapter::new("https://models.inference.ai.azure.com/", "k", None).unwrap();
        assert_eq!(adapter.url(), "https://models.inference.ai.azure.com/chat/completions");
    }

    #[tokio::test]
    async fn test_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 1000,
                "top_p": 1.0,
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "User question: hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[
                    {"message":{"role":"assistant","content":"First"},"finish_reason":"stop"},
                    {"message":{"role":"assistant","content":"Second"},"finish_reason":"stop"}
                ],"usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#,
            )
            .create_async()
            .await;

        let adapter = InferenceAdapter::new(&server.url(), "test-token", None).unwrap();
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        assert_eq!(response.content, "First");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().total_tokens, 12);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_from_source_uses_injected_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer injected-token")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"hi"},"finish_reason":"stop"}]}"#)
            .create_async()
            .await;

        let config = LLMConfig {
            endpoint: server.url(),
            ..LLMConfig::default()
        };
        let adapter =
            InferenceAdapter::from_source(&config, &StaticCredential("injected-token".into()))
                .unwrap();
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        assert_eq!(response.content, "hi");
        mock.assert_async().await;
    }

    #[test]
    fn test_from_source_propagates_missing_credential() {
        let source = EnvCredentialSource::new("RAGADATA_TEST_ADAPTER_TOKEN_ABSENT");
        let result = InferenceAdapter::from_source(&LLMConfig::default(), &source);
        assert!(matches!(result, Err(AppError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn test_service_error_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Bad credentials","code":"unauthorized"}}"#)
            .create_async()
            .await;

        let adapter = InferenceAdapter::new(&server.url(), "wrong", None).unwrap();
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();

        match err {
            AppError::RemoteServiceError(message) => assert!(message.contains("Bad credentials")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_choices_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let adapter = InferenceAdapter::new(&server.url(), "token", None).unwrap();
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteServiceError(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_remote_error() {
        // nothing listens on port 9 (discard) on test machines
        let adapter =
            InferenceAdapter::new("http://127.0.0.1:9", "token", Some(Duration::from_secs(2))).unwrap();
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteServiceError(_)));
    }
}
