//! Language-model backed oracles.
//!
//! ## Architecture
//!
//! ```text
//! AbbreviationOracle (trait)          DefinitionImprover
//!        │                                   │
//!        ▼                                   │
//! LlmAbbreviationOracle ──► prompts ◄────────┘
//!        │
//!        ▼
//! LlmClient (trait) ──► OpenAiClient (reqwest)
//! ```

pub mod abbreviation;
pub mod llm_client;
pub mod openai_client;
pub mod prompts;

pub use abbreviation::{sanitize_abbreviation, AbbreviationOracle, LlmAbbreviationOracle};
pub use llm_client::{ChatParams, LlmClient};
pub use openai_client::OpenAiClient;
pub use prompts::NONE_SENTINEL;
