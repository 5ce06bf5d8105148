//! Standard abbreviation recommender for Korean business terms
//!
//! Given a Korean term such as `계좌번호`, the recommender proposes an
//! English abbreviation (`ACNT_NO`) consistent with the company term
//! dictionary. A second entry point rewrites column definitions.
//!
//! ## Pipeline
//!
//! ```text
//! Input text
//!     │
//!     ▼
//! Tokenizer ──► [(surface, tag), ...]
//!     │
//!     ▼  per morpheme
//! ┌───────────────────────────────────────────────┐
//! │ exact term match ──► dictionary abbreviation  │
//! │ particle/ending/punct ──► skipped             │
//! │ otherwise: embed ──► similarity search ──►    │
//! │            oracle (select, else generate)     │
//! └───────────────────────────────────────────────┘
//!     │
//!     ▼
//! Permutation check against canonical abbreviations
//!     │
//!     ▼
//! Tokens joined with "_"
//! ```
//!
//! Every external capability (tokenizer, embedding service, LLM) sits behind
//! an `async_trait` so tests and alternative backends can be substituted.

pub mod config;
pub mod definition;
pub mod embedding;
pub mod error;
pub mod lexicon;
pub mod oracle;
pub mod recommend;
pub mod tokenizer;

// Re-exports for convenience
pub use config::{AppConfig, ColumnMapping};
pub use definition::{DefinitionImprover, DefinitionOutcome};
pub use embedding::{Embedder, OpenAiEmbedder};
pub use error::{CollaboratorError, LexiconError, OracleError};
pub use lexicon::{Candidate, Lexicon, LexiconCompiler, TermEntry};
pub use oracle::{AbbreviationOracle, ChatParams, LlmAbbreviationOracle, LlmClient, OpenAiClient};
pub use recommend::{Recommendation, Recommender, RecommenderConfig};
pub use tokenizer::{DictionaryTokenizer, Morpheme, PosTag, RemoteTokenizer, Tokenizer};
