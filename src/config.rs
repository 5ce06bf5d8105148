//! Runtime configuration loaded from the environment.
//!
//! Binaries call `dotenvy::dotenv().ok()` first, so a local `.env` file
//! works the same as exported variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::lexicon::{CANONICAL_EMBEDDING_DIM, DEFAULT_SIMILARITY_THRESHOLD};
use crate::oracle::ChatParams;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_RECOMMEND_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_DEFINITION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header names of the term and word sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub term_abbr: String,
    pub term_name: String,
    pub term_desc: String,
    pub word_name: String,
    pub word_abbr: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            term_abbr: "공통표준용어영문약어명".to_string(),
            term_name: "공통표준용어명".to_string(),
            term_desc: "공통표준용어설명".to_string(),
            word_name: "공통표준단어명".to_string(),
            word_abbr: "공통표준단어영문약어명".to_string(),
        }
    }
}

/// Connection settings shared by the chat and embedding clients.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    /// Parameters for abbreviation selection and generation.
    pub recommend: ChatParams,
    /// Parameters for definition improvement.
    pub definition: ChatParams,
    pub embedding: EmbeddingConfig,
    pub similarity_threshold: f32,
    /// Workbook export holding the term sheet and the word sheet.
    pub workbook_path: Option<PathBuf>,
    /// Workbook export holding the embedding column.
    pub embedding_path: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    pub columns: ColumnMapping,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig {
                api_key: String::new(),
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            recommend: ChatParams::new(DEFAULT_RECOMMEND_MODEL, 20, 0.2),
            definition: ChatParams::new(DEFAULT_DEFINITION_MODEL, 250, 0.3),
            embedding: EmbeddingConfig {
                model: DEFAULT_EMBEDDING_MODEL.to_string(),
                dimensions: CANONICAL_EMBEDDING_DIM,
            },
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            workbook_path: None,
            embedding_path: None,
            spreadsheet_id: None,
            columns: ColumnMapping::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// A missing `OPENAI_API_KEY` is not an error here; the clients reject an
    /// empty key when they are constructed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            config.openai.api_key = key;
        } else {
            tracing::warn!("OPENAI_API_KEY is not set; LLM and embedding calls will fail");
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.openai.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = get("TERM_ABBR_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("TERM_ABBR_TIMEOUT_SECS is not a number: {}", secs))?;
            config.openai.timeout = Duration::from_secs(secs);
        }
        if let Some(model) = get("TERM_ABBR_RECOMMEND_MODEL") {
            config.recommend.model = model;
        }
        if let Some(model) = get("TERM_ABBR_DEFINITION_MODEL") {
            config.definition.model = model;
        }
        if let Some(model) = get("TERM_ABBR_EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(dim) = get("TERM_ABBR_EMBEDDING_DIM") {
            config.embedding.dimensions = dim
                .parse()
                .with_context(|| format!("TERM_ABBR_EMBEDDING_DIM is not a number: {}", dim))?;
        }
        if let Some(threshold) = get("TERM_ABBR_SIMILARITY_THRESHOLD") {
            let value: f32 = threshold.parse().with_context(|| {
                format!("TERM_ABBR_SIMILARITY_THRESHOLD is not a number: {}", threshold)
            })?;
            if !(-1.0..=1.0).contains(&value) {
                return Err(anyhow!(
                    "TERM_ABBR_SIMILARITY_THRESHOLD must be within [-1, 1], got {}",
                    value
                ));
            }
            config.similarity_threshold = value;
        }
        config.workbook_path = get("TERM_ABBR_WORKBOOK").map(PathBuf::from);
        config.embedding_path = get("EXCEL_FILE_PATH").map(PathBuf::from);
        config.spreadsheet_id = get("SPREADSHEET_ID");

        Ok(config)
    }
}
