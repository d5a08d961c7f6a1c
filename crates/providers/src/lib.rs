//! Provider abstractions for chat-completion models and the tracking sink.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod canned;
pub mod notion;
pub mod openai;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("empty completion")]
    EmptyCompletion,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub content: String,
    pub total_tokens: u64,
}

#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<ChatCompletion, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    chats: HashMap<String, Arc<dyn ChatProvider>>,
    pub preferred_chat: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(mut self, name: &str, provider: Arc<dyn ChatProvider>) -> Self {
        self.chats.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_chat(mut self, name: &str) -> Self {
        self.preferred_chat = Some(name.to_string());
        self
    }

    pub fn chat(&self, name: Option<&str>) -> Result<Arc<dyn ChatProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_chat.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no chat provider configured".into()))?;
        self.chats
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}
