//! Chat-completion client for OpenAI-compatible endpoints.
//!
//! Implements [`ChatClient`] over the `POST /chat/completions` wire
//! shape using [`reqwest`]. Any OpenAI-compatible backend works; the
//! base URL, key, and default model come from the environment.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use siteforge_core::chat::{ChatClient, ChatMessage, ChatOptions};
use siteforge_core::error::CoreError;

/// Used when `CHAT_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Used when neither the request nor `CHAT_MODEL` names a model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the chat backend.
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl ChatClientConfig {
    /// Load settings from the environment. `CHAT_API_KEY` is required;
    /// everything else has a default.
    pub fn from_env() -> Result<Self, CoreError> {
        let api_key = std::env::var("CHAT_API_KEY")
            .map_err(|_| CoreError::Chat("CHAT_API_KEY is not set".to_string()))?;
        let base_url = std::env::var("CHAT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout = std::env::var("CHAT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            base_url,
            api_key,
            model,
            timeout,
        })
    }
}

/// [`ChatClient`] over an OpenAI-compatible HTTP API.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    config: ChatClientConfig,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(config: ChatClientConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::Chat(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(ChatClientConfig::from_env()?)
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, CoreError> {
        let mut messages = messages.to_vec();
        if let Some(custom) = &options.custom_prompt {
            messages.push(ChatMessage::system(custom.clone()));
        }

        let model = options.model.as_deref().unwrap_or(&self.config.model);
        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if let Some(user_id) = &options.user_id {
            body["user"] = serde_json::Value::String(user_id.clone());
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Chat(format!("Chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Chat(format!(
                "Chat backend returned {status}: {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Chat(format!("Malformed chat response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CoreError::Chat("Chat response had no content".to_string()))
    }
}
