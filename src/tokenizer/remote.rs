//! Client for an HTTP morphological analyzer service.
//!
//! The service receives `{"text": "..."}` and answers with a JSON array of
//! morphemes, either as `[surface, tag]` pairs (the shape of a serialized
//! Okt `pos()` result) or as `{"surface": ..., "tag": ...}` objects. Tags use
//! Okt naming.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Morpheme, PosTag, Tokenizer};
use crate::error::{CollaboratorError, CollaboratorResult};

const SERVICE: &str = "tokenizer";

#[derive(Debug, Clone)]
pub struct RemoteTokenizer {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMorpheme {
    Pair(String, String),
    Object { surface: String, tag: String },
}

impl From<WireMorpheme> for Morpheme {
    fn from(wire: WireMorpheme) -> Self {
        let (surface, tag) = match wire {
            WireMorpheme::Pair(surface, tag) => (surface, tag),
            WireMorpheme::Object { surface, tag } => (surface, tag),
        };
        Morpheme::new(surface, PosTag::from_okt(&tag))
    }
}

impl RemoteTokenizer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> CollaboratorResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse_response(body: &str) -> CollaboratorResult<Vec<Morpheme>> {
        let wire: Vec<WireMorpheme> =
            serde_json::from_str(body).map_err(|e| CollaboratorError::InvalidResponse {
                service: SERVICE,
                message: e.to_string(),
            })?;
        Ok(wire.into_iter().map(Morpheme::from).collect())
    }
}

#[async_trait]
impl Tokenizer for RemoteTokenizer {
    async fn tokenize(&self, text: &str) -> CollaboratorResult<Vec<Morpheme>> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
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

        let morphemes = Self::parse_response(&body)?;
        debug!(count = morphemes.len(), "remote tokenizer response");
        Ok(morphemes)
    }
}
