//! Term dictionary and embedding similarity search.
//!
//! ## Architecture
//!
//! ```text
//! Workbook export (YAML/JSON)          Embedding sheet export
//!   sheet1: terms   sheet2: words        "embedding" column
//!          │                                    │
//!          └──────────────┬─────────────────────┘
//!                         ▼
//!                 LexiconCompiler::build()
//!                         │  (dimension audit, hash)
//!                         ▼
//!                 Lexicon (immutable, Arc-shared)
//!                    ├── lookup_exact(term)
//!                    └── search(query_vector, threshold)
//! ```
//!
//! A compiled lexicon can also be written to and read from a bincode
//! snapshot so start-up does not need to re-parse the workbook.

mod compiler;
mod search;
mod snapshot;
mod types;
pub mod workbook;

pub use compiler::LexiconCompiler;
pub use search::{cosine_similarity, l2_norm, DEFAULT_SIMILARITY_THRESHOLD};
pub use snapshot::{Lexicon, LexiconStats};
pub use types::{Candidate, EmbeddingAudit, TermEntry, CANONICAL_EMBEDDING_DIM};
pub use workbook::{parse_embedding, EmbeddingCell, Record, Sheet, Workbook};
