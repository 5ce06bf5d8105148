//! Cosine similarity search over the lexicon's embedding corpus.

use super::snapshot::Lexicon;
use super::types::Candidate;

/// Minimum (exclusive) cosine similarity for a term to become a candidate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// L2 norm of a vector
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity of two vectors.
///
/// Returns `None` when the lengths differ or the vectors are empty. A zero
/// vector has similarity 0 with everything. The result is clamped to
/// [-1, 1] to absorb floating point drift.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 || !denom.is_finite() {
        return Some(0.0);
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    Some((dot / denom).clamp(-1.0, 1.0))
}

impl Lexicon {
    /// All entries whose embedding is more similar than `threshold` to
    /// `query`, in lexicon order.
    ///
    /// Entries without an embedding, or whose embedding length differs from
    /// the query, are skipped. Results are not deduplicated and not capped.
    pub fn search(&self, query: &[f32], threshold: f32) -> Vec<Candidate> {
        let mut skipped = 0usize;
        let matches: Vec<Candidate> = self
            .entries()
            .iter()
            .filter_map(|entry| {
                let embedding = entry.embedding.as_deref()?;
                match cosine_similarity(query, embedding) {
                    Some(sim) if sim > threshold => {
                        Some(Candidate::new(&entry.term, &entry.abbreviation))
                    }
                    Some(_) => None,
                    None => {
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(
            matches = matches.len(),
            dimension_mismatches = skipped,
            threshold,
            "similarity search"
        );
        matches
    }
}
