//! HTTP routes
//!
//! - `/api/files` - upload a CSV/XLS/XLSX/PDF into a session
//! - `/api/sessions` - create sessions, fetch previews, build charts
//! - `/api/chat` - ask the language model about the session's data
//! - `/api/health` - liveness
//! - `/`, `/about`, `/guides`, `/support` - HTML pages

pub mod chat;
pub mod files;
pub mod health;
pub mod sessions;
pub mod ui;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
///
/// API routes are prefixed with `/api/`; pages are served from the root.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();
    let api_router = Router::new()
        .merge(health::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(chat::router(state));

    let app = Router::new()
        .merge(api_router)
        .merge(ui::router())
        .layer(TraceLayer::new_for_http());
    apply_cors(app, &origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::MockLLMAdapter;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----ragadata-test-boundary";

    fn app_with(adapter: Arc<MockLLMAdapter>) -> Router {
        create_router(AppState::new(Config::default(), adapter))
    }

    fn upload_request(filename: &str, contents: &[u8], session_id: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(id) = session_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"session_id\"\r\n\r\n{id}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn upload_csv(app: &Router, contents: &str) -> String {
        let (status, json) = send(app, upload_request("data.csv", contents.as_bytes(), None)).await;
        assert_eq!(status, StatusCode::OK, "upload failed: {json}");
        json["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_csv_then_scatter_chart() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let (status, json) = send(&app, upload_request("data.csv", b"a,b\n1,2\n2,4\n3,6\n", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["preview"]["kind"], "table");
        assert_eq!(json["preview"]["rows"], 3);
        assert_eq!(json["preview"]["numeric_columns"], serde_json::json!(["a", "b"]));
        let session_id = json["session_id"].as_str().unwrap().to_string();

        let (status, json) = send(
            &app,
            json_request(
                &format!("/api/sessions/{session_id}/chart"),
                serde_json::json!({ "kind": "Scatter Plot", "x": "a", "y": "b" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["chart"]["title"], "b vs a");
        assert_eq!(json["insights"]["correlation"], "1.00");

        let request = Request::builder()
            .uri(format!("/api/sessions/{session_id}/preview"))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["chart"]["kind"], "Scatter Plot");
        assert_eq!(json["chart"]["x"], "a");
        assert_eq!(json["chart"]["y"], "b");

        // a new file resets the selection
        let (status, _) = send(
            &app,
            upload_request("data.csv", b"a,b\n1,2\n", Some(&session_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let request = Request::builder()
            .uri(format!("/api/sessions/{session_id}/preview"))
            .body(Body::empty())
            .unwrap();
        let (_, json) = send(&app, request).await;
        assert!(json["chart"].is_null());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_415() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let (status, json) = send(&app, upload_request("notes.txt", b"hello", None)).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(json["error"], "UnsupportedFormat");
    }

    #[tokio::test]
    async fn test_rejected_upload_clears_previous_data() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let session_id = upload_csv(&app, "a,b\n1,2\n2,4\n").await;

        let (status, _) = send(
            &app,
            upload_request("notes.docx", b"hello", Some(&session_id)),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let request = Request::builder()
            .uri(format!("/api/sessions/{session_id}/preview"))
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["preview"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_column_is_400() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let session_id = upload_csv(&app, "a,b\n1,2\n2,4\n").await;
        let (status, json) = send(
            &app,
            json_request(
                &format!("/api/sessions/{session_id}/chart"),
                serde_json::json!({ "kind": "Line Chart", "x": "a", "y": "missing" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "InvalidColumn");
    }

    #[tokio::test]
    async fn test_single_numeric_column_is_422() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let session_id = upload_csv(&app, "name,score\nx,1\ny,2\n").await;
        let (status, json) = send(
            &app,
            json_request(
                &format!("/api/sessions/{session_id}/chart"),
                serde_json::json!({ "kind": "Histogram", "x": "score" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "InsufficientNumericColumns");
    }

    #[tokio::test]
    async fn test_chat_without_session_sends_bare_question() {
        let adapter = Arc::new(MockLLMAdapter::answering("Looks fine."));
        let app = app_with(adapter.clone());
        let (status, json) = send(
            &app,
            json_request("/api/chat", serde_json::json!({ "question": "What is here?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], "Looks fine.");
        assert_eq!(json["context_chars"], 0);

        let requests = adapter.requests();
        assert_eq!(requests.len(), 1);
        let user = requests[0].messages.last().unwrap();
        assert_eq!(user.content, "User question: What is here?");
    }

    #[tokio::test]
    async fn test_chat_with_table_sends_summary() {
        let adapter = Arc::new(MockLLMAdapter::answering("Two columns."));
        let app = app_with(adapter.clone());
        let session_id = upload_csv(&app, "a,b\n1,2\n2,4\n").await;
        let (status, _) = send(
            &app,
            json_request(
                "/api/chat",
                serde_json::json!({ "session_id": session_id, "question": "  " }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let requests = adapter.requests();
        let user = &requests[0].messages.last().unwrap().content;
        assert!(user.starts_with("Data summary:\n"));
        assert!(user.ends_with(&format!("User question: {}", chat::DEFAULT_QUESTION)));
    }

    #[tokio::test]
    async fn test_remote_failure_is_502() {
        let app = app_with(Arc::new(MockLLMAdapter::failing("quota exceeded")));
        let (status, json) = send(
            &app,
            json_request("/api/chat", serde_json::json!({ "question": "Hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "RemoteServiceError");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app_with(Arc::new(MockLLMAdapter::answering("ok")));
        let request = Request::builder()
            .uri(format!("/api/sessions/{}/preview", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
