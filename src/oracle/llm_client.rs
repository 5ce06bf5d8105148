//! LLM client abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorResult;

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatParams {
    pub fn new(model: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }
}

/// Single-turn chat completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one user message and return the trimmed reply text.
    async fn chat(&self, prompt: &str, params: &ChatParams) -> CollaboratorResult<String>;

    fn provider_name(&self) -> &str;

    /// Round-trip a short greeting to verify credentials and connectivity.
    async fn ping(&self) -> CollaboratorResult<String> {
        let params = ChatParams::new("gpt-3.5-turbo", 20, 0.2);
        self.chat("안녕하세요. 테스트입니다.", &params).await
    }
}
