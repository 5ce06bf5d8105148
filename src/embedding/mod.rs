//! Text embedding capability.
//!
//! The recommender treats embedding as an opaque oracle: a string goes in, a
//! fixed-length vector comes out. The dimensionality is expected to match
//! the lexicon corpus but is not enforced; mismatched entries are simply
//! skipped by similarity search.

mod openai;

use async_trait::async_trait;

use crate::error::CollaboratorResult;

pub use openai::OpenAiEmbedder;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> CollaboratorResult<Vec<f32>>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
