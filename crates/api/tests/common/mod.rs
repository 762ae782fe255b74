use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use siteforge_api::config::ServerConfig;
use siteforge_api::router::build_app_router;
use siteforge_api::state::AppState;
use siteforge_core::chat::{ChatClient, ChatMessage, ChatOptions};
use siteforge_core::error::CoreError;
use siteforge_engine::memory::MemoryTemplateStore;
use siteforge_engine::render::TemplateRenderer;
use siteforge_engine::{EngineConfig, PlanningEngine};

/// Chat client replaying a fixed script of responses.
pub struct ScriptedChat {
    responses: Mutex<Vec<Result<String, CoreError>>>,
}

impl ScriptedChat {
    pub fn new(responses: Vec<Result<String, CoreError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<String, CoreError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(CoreError::Chat("script exhausted".to_string()));
        }
        responses.remove(0)
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application router over the in-memory store, the
/// built-in fallback library, and a scripted chat client.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware stack that production uses.
pub fn build_test_app(chat_script: Vec<Result<String, CoreError>>) -> Router {
    let config = test_config();
    let store = Arc::new(MemoryTemplateStore::with_builtin_library());
    let fallback = Arc::new(MemoryTemplateStore::with_builtin_library());
    let engine = Arc::new(PlanningEngine::new(
        store,
        Arc::new(ScriptedChat::new(chat_script)),
        Arc::new(TemplateRenderer::new()),
        fallback,
        EngineConfig::default(),
    ));

    let state = AppState {
        engine,
        pool: None,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request build failed"),
    )
    .await
    .expect("request failed")
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request build failed"),
    )
    .await
    .expect("request failed")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body read failed");
    serde_json::from_slice(&bytes).expect("body is not valid JSON")
}
