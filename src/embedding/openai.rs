//! OpenAI embeddings client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::Embedder;
use crate::config::{EmbeddingConfig, OpenAiConfig};
use crate::error::{CollaboratorError, CollaboratorResult};

const SERVICE: &str = "OpenAI embeddings";

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    api_key: String,
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

impl OpenAiEmbedder {
    pub fn new(openai: &OpenAiConfig, embedding: &EmbeddingConfig) -> CollaboratorResult<Self> {
        if openai.api_key.is_empty() {
            return Err(CollaboratorError::Config(
                "OPENAI_API_KEY environment variable not set".to_string(),
            ));
        }

        let client = Client::builder().timeout(openai.timeout).build()?;

        Ok(Self {
            api_key: openai.api_key.clone(),
            client,
            base_url: openai.base_url.clone(),
            model: embedding.model.clone(),
            dimensions: embedding.dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "input": [text],
            "model": &self.model,
            "dimensions": self.dimensions,
        })
    }

    fn parse_response(body: &str) -> CollaboratorResult<Vec<f32>> {
        let response: EmbeddingResponse =
            serde_json::from_str(body).map_err(|e| CollaboratorError::InvalidResponse {
                service: SERVICE,
                message: format!("Failed to parse embedding response: {}", e),
            })?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CollaboratorError::InvalidResponse {
                service: SERVICE,
                message: "response contained no embedding".to_string(),
            })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> CollaboratorResult<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let embedding = Self::parse_response(&body)?;
        debug!(dimensions = embedding.len(), "embedding received");
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
