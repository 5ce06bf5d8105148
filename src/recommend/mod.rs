//! Abbreviation recommendation.
//!
//! [`Recommender`] wires the lexicon to the tokenizer, embedding and oracle
//! capabilities; [`find_permutation_match`] replaces an assembled token list
//! with an existing canonical abbreviation made of the same tokens.

mod permutation;
mod recommender;

pub use permutation::find_permutation_match;
pub use recommender::{
    MorphemeResolution, MorphemeTrace, Recommendation, Recommender, RecommenderConfig,
};
