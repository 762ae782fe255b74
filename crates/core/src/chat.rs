//! Chat-completion client contract.
//!
//! The planner drives whatever implements [`ChatClient`]; the engine
//! crate ships an OpenAI-compatible HTTP implementation and tests use
//! scripted fakes. The contract is full-text in, full-text out; any
//! streaming is the implementation's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Role of one chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Per-call options forwarded to the chat client.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// End-user identifier for attribution, if the backend supports it.
    pub user_id: Option<String>,
    /// Extra system prompt appended by the caller.
    pub custom_prompt: Option<String>,
    /// Model override; implementations fall back to their default.
    pub model: Option<String>,
}

/// A chat-completion backend: takes a message list, returns model text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, CoreError>;
}
