//! OpenAI Client
//!
//! LLM client implementation for the OpenAI chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::llm_client::{ChatParams, LlmClient};
use crate::config::OpenAiConfig;
use crate::error::{CollaboratorError, CollaboratorResult};

const SERVICE: &str = "OpenAI";

/// OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl OpenAiClient {
    /// Create a client from connection settings. An empty API key is rejected.
    pub fn new(config: &OpenAiConfig) -> CollaboratorResult<Self> {
        if config.api_key.is_empty() {
            return Err(CollaboratorError::Config(
                "OPENAI_API_KEY environment variable not set".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn request_body(prompt: &str, params: &ChatParams) -> serde_json::Value {
        serde_json::json!({
            "model": &params.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": params.max_tokens,
            "temperature": params.temperature
        })
    }

    fn parse_response(body: &str) -> CollaboratorResult<String> {
        let api_response: ApiResponse =
            serde_json::from_str(body).map_err(|e| CollaboratorError::InvalidResponse {
                service: SERVICE,
                message: format!("Failed to parse OpenAI response: {}", e),
            })?;

        if let Some(usage) = &api_response.usage {
            debug!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "OpenAI usage"
            );
        }

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| CollaboratorError::InvalidResponse {
                service: SERVICE,
                message: "OpenAI returned no choices".to_string(),
            })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, prompt: &str, params: &ChatParams) -> CollaboratorResult<String> {
        debug!(model = %params.model, "calling OpenAI chat completions");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&Self::request_body(prompt, params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("OpenAI API error: {} - {}", status, body);
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_response(&body)
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}
