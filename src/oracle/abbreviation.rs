//! Abbreviation oracle: choose an existing abbreviation or coin a new one.
//!
//! ```text
//! candidates non-empty ──► Selection ──┬── candidate term ──► its abbreviation
//!                                      ├── other text ──────► sanitized token
//!                                      └── "NONE" ───┐
//! candidates empty ──────────────────────────────────┴──► Generation ──► sanitized token
//! ```
//!
//! Generation is reached at most once per call and never loops back to
//! selection.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, instrument};
use unicode_normalization::UnicodeNormalization;

use super::llm_client::{ChatParams, LlmClient};
use super::prompts::{generation_prompt, selection_prompt, NONE_SENTINEL};
use crate::error::{OracleError, OracleResult};
use crate::lexicon::Candidate;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Z0-9_]").unwrap());
static UNDERSCORE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").unwrap());

/// Proposes one abbreviation token for a word.
#[async_trait]
pub trait AbbreviationOracle: Send + Sync {
    async fn propose(&self, word: &str, candidates: &[Candidate]) -> OracleResult<String>;
}

/// Outcome of the selection step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    /// The model named one of the candidate terms.
    Chosen(String),
    /// The model answered with something that is not a candidate term.
    Novel(String),
    /// The model answered the sentinel.
    NoneFits,
}

/// Keep only uppercase letters, digits and single underscores.
///
/// Only the first non-empty line of the reply is considered, so trailing
/// explanations are dropped.
pub fn sanitize_abbreviation(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_uppercase();
    let kept = DISALLOWED.replace_all(&line, "");
    let collapsed = UNDERSCORE_RUNS.replace_all(&kept, "_");
    collapsed.trim_matches('_').to_string()
}

/// [`AbbreviationOracle`] backed by an [`LlmClient`].
pub struct LlmAbbreviationOracle {
    client: Arc<dyn LlmClient>,
    params: ChatParams,
}

impl LlmAbbreviationOracle {
    pub fn new(client: Arc<dyn LlmClient>, params: ChatParams) -> Self {
        Self { client, params }
    }

    async fn select(&self, word: &str, candidates: &[Candidate]) -> OracleResult<Selection> {
        let reply = self
            .client
            .chat(&selection_prompt(word, candidates), &self.params)
            .await?;

        if reply == NONE_SENTINEL {
            return Ok(Selection::NoneFits);
        }
        match candidates.iter().find(|c| c.term.nfc().eq(reply.nfc())) {
            Some(candidate) => Ok(Selection::Chosen(candidate.abbreviation.clone())),
            None => Ok(Selection::Novel(reply)),
        }
    }

    async fn generate(&self, word: &str) -> OracleResult<String> {
        let reply = self
            .client
            .chat(&generation_prompt(word), &self.params)
            .await?;
        let abbreviation = sanitize_abbreviation(&reply);
        if abbreviation.is_empty() {
            return Err(OracleError::EmptyAbbreviation {
                word: word.to_string(),
            });
        }
        info!(word, %abbreviation, "generated new abbreviation");
        Ok(abbreviation)
    }
}

#[async_trait]
impl AbbreviationOracle for LlmAbbreviationOracle {
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    async fn propose(&self, word: &str, candidates: &[Candidate]) -> OracleResult<String> {
        if !candidates.is_empty() {
            match self.select(word, candidates).await? {
                Selection::Chosen(abbreviation) => {
                    debug!(%abbreviation, "selected existing abbreviation");
                    return Ok(abbreviation);
                }
                Selection::Novel(reply) => {
                    let abbreviation = sanitize_abbreviation(&reply);
                    if abbreviation.is_empty() {
                        return Err(OracleError::EmptyAbbreviation {
                            word: word.to_string(),
                        });
                    }
                    debug!(%abbreviation, "selection reply was not a candidate term");
                    return Ok(abbreviation);
                }
                Selection::NoneFits => {
                    debug!("no candidate fits; generating");
                }
            }
        }
        self.generate(word).await
    }
}
