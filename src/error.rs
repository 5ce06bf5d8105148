//! Error types for the abbreviation recommender
//!
//! Only lexicon construction failures are fatal. Collaborator and oracle
//! errors are recoverable per morpheme and are absorbed by the recommender.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while building or loading a [`crate::lexicon::Lexicon`].
#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Sheet '{sheet}' not found in workbook")]
    MissingSheet { sheet: String },

    #[error("Lexicon is empty: no term entries and no canonical abbreviations")]
    Empty,

    #[error("Term/abbreviation length mismatch: {terms} terms, {abbreviations} abbreviations")]
    LengthMismatch { terms: usize, abbreviations: usize },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Failures of the external collaborators (tokenizer, embedding service, LLM).
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("{service} call timed out after {timeout:?}")]
    Timeout {
        service: &'static str,
        timeout: Duration,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from the language-model backed oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] CollaboratorError),

    #[error("LLM returned no usable abbreviation for '{word}'")]
    EmptyAbbreviation { word: String },

    #[error("LLM returned an empty definition for '{abbreviation}'")]
    EmptyDefinition { abbreviation: String },
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
pub type OracleResult<T> = Result<T, OracleError>;
