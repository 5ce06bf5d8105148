//! Recommendation orchestrator.
//!
//! ```text
//! TOKENIZE ──► PER_MORPHEME_RESOLVE ──► PERMUTATION_CHECK ──► JOIN
//! ```
//!
//! No state is revisited, so a call always terminates after at most one
//! resolution per morpheme. Failures of the tokenizer, the embedding service
//! or the oracle only lower the quality of the answer: the affected morpheme
//! contributes no token, and `recommend` still returns a string.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::permutation::find_permutation_match;
use crate::error::CollaboratorError;
use crate::lexicon::{Lexicon, DEFAULT_SIMILARITY_THRESHOLD};
use crate::embedding::Embedder;
use crate::oracle::AbbreviationOracle;
use crate::tokenizer::{Morpheme, Tokenizer};

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    pub similarity_threshold: f32,
    /// Upper bound for each tokenizer, embedding and oracle call.
    pub call_timeout: Duration,
    /// Resolve morphemes concurrently. Output order is unaffected.
    pub concurrent_morphemes: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            call_timeout: Duration::from_secs(60),
            concurrent_morphemes: false,
        }
    }
}

/// How one morpheme was handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MorphemeResolution {
    /// Surface matched a dictionary term; the oracle was not consulted.
    ExactMatch { abbreviation: String },
    /// Grammatical morpheme (particle, ending, punctuation).
    Skipped,
    /// Oracle answer after similarity search.
    Proposed {
        abbreviation: String,
        candidates: usize,
    },
    /// Embedding or oracle failure; no token contributed.
    Failed { reason: String },
}

impl MorphemeResolution {
    pub fn abbreviation(&self) -> Option<&str> {
        match self {
            MorphemeResolution::ExactMatch { abbreviation }
            | MorphemeResolution::Proposed { abbreviation, .. } => Some(abbreviation),
            MorphemeResolution::Skipped | MorphemeResolution::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphemeTrace {
    pub morpheme: Morpheme,
    pub resolution: MorphemeResolution,
}

/// Result of one recommendation with its per-morpheme trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Joined abbreviation; empty means "no recommendation".
    pub abbreviation: String,
    /// Whether an existing canonical abbreviation replaced the assembled tokens.
    pub canonical_match: bool,
    pub trace: Vec<MorphemeTrace>,
}

impl Recommendation {
    fn empty() -> Self {
        Self {
            abbreviation: String::new(),
            canonical_match: false,
            trace: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.abbreviation.is_empty()
    }
}

pub struct Recommender {
    lexicon: Arc<Lexicon>,
    tokenizer: Arc<dyn Tokenizer>,
    embedder: Arc<dyn Embedder>,
    oracle: Arc<dyn AbbreviationOracle>,
    config: RecommenderConfig,
}

impl Recommender {
    pub fn new(
        lexicon: Arc<Lexicon>,
        tokenizer: Arc<dyn Tokenizer>,
        embedder: Arc<dyn Embedder>,
        oracle: Arc<dyn AbbreviationOracle>,
    ) -> Self {
        Self::with_config(lexicon, tokenizer, embedder, oracle, RecommenderConfig::default())
    }

    pub fn with_config(
        lexicon: Arc<Lexicon>,
        tokenizer: Arc<dyn Tokenizer>,
        embedder: Arc<dyn Embedder>,
        oracle: Arc<dyn AbbreviationOracle>,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            lexicon,
            tokenizer,
            embedder,
            oracle,
            config,
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Recommend an abbreviation for `text`. Empty string means none.
    pub async fn recommend(&self, text: &str) -> String {
        self.recommend_detailed(text).await.abbreviation
    }

    /// Recommend an abbreviation and report how each morpheme was resolved.
    #[instrument(skip(self), fields(text = %text))]
    pub async fn recommend_detailed(&self, text: &str) -> Recommendation {
        if text.trim().is_empty() {
            return Recommendation::empty();
        }

        // TOKENIZE
        let morphemes = match self
            .bounded("tokenizer", self.tokenizer.tokenize(text))
            .await
        {
            Ok(morphemes) => morphemes,
            Err(e) => {
                warn!(error = %e, "tokenizer failed; no recommendation");
                return Recommendation::empty();
            }
        };
        debug!(?morphemes, "tokenized");

        // PER_MORPHEME_RESOLVE
        let resolutions = if self.config.concurrent_morphemes {
            join_all(morphemes.iter().map(|m| self.resolve(m))).await
        } else {
            let mut resolutions = Vec::with_capacity(morphemes.len());
            for morpheme in &morphemes {
                resolutions.push(self.resolve(morpheme).await);
            }
            resolutions
        };

        let trace: Vec<MorphemeTrace> = morphemes
            .into_iter()
            .zip(resolutions)
            .map(|(morpheme, resolution)| MorphemeTrace {
                morpheme,
                resolution,
            })
            .collect();

        let tokens: Vec<&str> = trace
            .iter()
            .filter_map(|t| t.resolution.abbreviation())
            .collect();

        // PERMUTATION_CHECK
        let (abbreviation, canonical_match) =
            match find_permutation_match(&tokens, self.lexicon.canonical()) {
                Some(canonical) => {
                    info!(%canonical, "reusing existing abbreviation");
                    (canonical.to_string(), true)
                }
                // JOIN
                None => (tokens.join("_"), false),
            };

        info!(%abbreviation, canonical_match, "recommendation complete");
        Recommendation {
            abbreviation,
            canonical_match,
            trace,
        }
    }

    async fn resolve(&self, morpheme: &Morpheme) -> MorphemeResolution {
        if let Some(entry) = self.lexicon.lookup_exact(&morpheme.surface.to_uppercase()) {
            return MorphemeResolution::ExactMatch {
                abbreviation: entry.abbreviation.clone(),
            };
        }
        if morpheme.tag.is_excluded() {
            return MorphemeResolution::Skipped;
        }

        let query = match self
            .bounded("embedding", self.embedder.embed(&morpheme.surface))
            .await
        {
            Ok(query) => query,
            Err(e) => {
                warn!(word = %morpheme.surface, error = %e, "embedding failed");
                return MorphemeResolution::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let candidates = self.lexicon.search(&query, self.config.similarity_threshold);
        match self
            .bounded(
                "oracle",
                self.oracle.propose(&morpheme.surface, &candidates),
            )
            .await
        {
            Ok(abbreviation) => {
                debug!(word = %morpheme.surface, %abbreviation, "oracle proposal");
                MorphemeResolution::Proposed {
                    abbreviation,
                    candidates: candidates.len(),
                }
            }
            Err(e) => {
                warn!(word = %morpheme.surface, error = %e, "oracle failed");
                MorphemeResolution::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Apply the per-call timeout; an elapsed timer becomes the
    /// collaborator's own error type.
    async fn bounded<T, E, F>(&self, service: &'static str, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<CollaboratorError>,
    {
        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout { service, timeout }.into()),
        }
    }
}
