//! Morphological tokenizer capability.
//!
//! The recommender only needs `(surface, tag)` pairs and a way to tell
//! grammatical morphemes (particles, verbal endings, punctuation) from
//! content morphemes. Two implementations ship with the crate:
//! - [`DictionaryTokenizer`]: in-process Hangul segmenter driven by the
//!   lexicon vocabulary
//! - [`RemoteTokenizer`]: client for an HTTP morphological analyzer

mod dictionary;
mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorResult;

pub use dictionary::DictionaryTokenizer;
pub use remote::RemoteTokenizer;

/// Part-of-speech classes relevant to abbreviation building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    /// Case marker or postposition (조사)
    Particle,
    /// Inflectional ending (어미)
    VerbalEnding,
    Punctuation,
    Number,
    /// Latin-script word
    Foreign,
    Other,
}

impl PosTag {
    /// Grammatical classes that never contribute an abbreviation token.
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            PosTag::Particle | PosTag::VerbalEnding | PosTag::Punctuation
        )
    }

    /// Map an Okt-style tag name (`Josa`, `Eomi`, `Noun`, ...) to a class.
    pub fn from_okt(tag: &str) -> Self {
        match tag {
            "Noun" | "ProperNoun" => PosTag::Noun,
            "Verb" => PosTag::Verb,
            "Adjective" => PosTag::Adjective,
            "Josa" => PosTag::Particle,
            "Eomi" | "PreEomi" => PosTag::VerbalEnding,
            "Punctuation" => PosTag::Punctuation,
            "Number" => PosTag::Number,
            "Alpha" | "Foreign" => PosTag::Foreign,
            _ => PosTag::Other,
        }
    }
}

impl std::fmt::Display for PosTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PosTag::Noun => "Noun",
            PosTag::Verb => "Verb",
            PosTag::Adjective => "Adjective",
            PosTag::Particle => "Josa",
            PosTag::VerbalEnding => "Eomi",
            PosTag::Punctuation => "Punctuation",
            PosTag::Number => "Number",
            PosTag::Foreign => "Alpha",
            PosTag::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Smallest tagged unit produced by tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morpheme {
    pub surface: String,
    pub tag: PosTag,
}

impl Morpheme {
    pub fn new(surface: impl Into<String>, tag: PosTag) -> Self {
        Self {
            surface: surface.into(),
            tag,
        }
    }
}

/// Splits text into tagged morphemes, preserving input order.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    async fn tokenize(&self, text: &str) -> CollaboratorResult<Vec<Morpheme>>;
}
