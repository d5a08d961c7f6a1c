//! Canned provider for dry-run mode: answers every request with a fixed
//! payload so no network I/O or cost is incurred.

use crate::{ChatCompletion, ChatProvider, ChatRequest, ProviderError};

#[derive(Debug, Clone)]
pub struct CannedProvider {
    payload: String,
}

impl CannedProvider {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Default for CannedProvider {
    fn default() -> Self {
        Self::new(
            r#"{"technical_skills": 82, "experience_level": 78, "domain_relevance": 80, "soft_skills": 85, "rationale": "Canned dry-run evaluation."}"#,
        )
    }
}

#[async_trait::async_trait]
impl ChatProvider for CannedProvider {
    async fn complete(&self, _request: ChatRequest<'_>) -> Result<ChatCompletion, ProviderError> {
        Ok(ChatCompletion {
            content: self.payload.clone(),
            total_tokens: 0,
        })
    }
}
