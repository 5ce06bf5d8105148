//! Core lexicon types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Expected dimensionality of the embedding corpus.
///
/// Rows with other lengths are tolerated and reported by the audit.
pub const CANONICAL_EMBEDDING_DIM: usize = 1536;

/// A dictionary word paired with its standard abbreviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    pub abbreviation: String,
    /// Precomputed embedding. `None` excludes the entry from similarity
    /// search but keeps it eligible for exact lookup.
    pub embedding: Option<Vec<f32>>,
}

impl TermEntry {
    pub fn new(term: impl Into<String>, abbreviation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            abbreviation: abbreviation.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A similarity search hit.
///
/// Term and abbreviation travel together so a term chosen by the oracle
/// resolves to the abbreviation of the entry that produced it, even when the
/// same term text appears several times with different abbreviations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub term: String,
    pub abbreviation: String,
}

impl Candidate {
    pub fn new(term: impl Into<String>, abbreviation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            abbreviation: abbreviation.into(),
        }
    }
}

/// Dimensionality report produced while loading embeddings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingAudit {
    /// Number of parsed vectors per dimensionality.
    pub dimension_counts: BTreeMap<usize, usize>,
    /// `(row, dimension)` of every vector whose length is not canonical.
    pub non_canonical: Vec<(usize, usize)>,
    /// `(row, reason)` of every cell that could not be parsed.
    pub malformed: Vec<(usize, String)>,
    /// Rows with no embedding text at all.
    pub blank: usize,
}

impl EmbeddingAudit {
    pub fn record_vector(&mut self, row: usize, dimension: usize) {
        *self.dimension_counts.entry(dimension).or_insert(0) += 1;
        if dimension != CANONICAL_EMBEDDING_DIM {
            self.non_canonical.push((row, dimension));
        }
    }

    pub fn record_malformed(&mut self, row: usize, reason: impl Into<String>) {
        self.malformed.push((row, reason.into()));
    }

    pub fn record_blank(&mut self) {
        self.blank += 1;
    }

    pub fn parsed(&self) -> usize {
        self.dimension_counts.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.non_canonical.is_empty() && self.malformed.is_empty()
    }

    /// Emit the report through `tracing`.
    pub fn log(&self) {
        for (dimension, count) in &self.dimension_counts {
            tracing::info!(dimension, count, "embedding dimension");
        }
        if self.is_clean() {
            tracing::info!(
                parsed = self.parsed(),
                blank = self.blank,
                "all embeddings have canonical dimension {}",
                CANONICAL_EMBEDDING_DIM
            );
            return;
        }
        for (row, dimension) in self.non_canonical.iter().take(20) {
            tracing::warn!(row, dimension, "non-canonical embedding dimension");
        }
        if self.non_canonical.len() > 20 {
            tracing::warn!(
                "... and {} more non-canonical embeddings",
                self.non_canonical.len() - 20
            );
        }
        for (row, reason) in &self.malformed {
            tracing::warn!(row, %reason, "unparsable embedding excluded from search");
        }
    }
}

impl std::fmt::Display for EmbeddingAudit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Embedding Dimension Audit:")?;
        for (dimension, count) in &self.dimension_counts {
            writeln!(f, "  {} dims: {}", dimension, count)?;
        }
        writeln!(f, "  Blank rows: {}", self.blank)?;
        writeln!(f, "  Malformed rows: {}", self.malformed.len())?;
        if self.non_canonical.is_empty() {
            writeln!(
                f,
                "  All embeddings are {}-dimensional",
                CANONICAL_EMBEDDING_DIM
            )?;
        } else {
            writeln!(f, "  Non-canonical rows: {}", self.non_canonical.len())?;
            for (row, dimension) in self.non_canonical.iter().take(20) {
                writeln!(f, "    row {}: {} dims", row, dimension)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_counts() {
        let mut audit = EmbeddingAudit::default();
        audit.record_vector(0, CANONICAL_EMBEDDING_DIM);
        audit.record_vector(1, CANONICAL_EMBEDDING_DIM);
        audit.record_vector(2, 768);
        audit.record_blank();
        audit.record_malformed(4, "invalid float literal");

        assert_eq!(audit.parsed(), 3);
        assert_eq!(audit.dimension_counts[&CANONICAL_EMBEDDING_DIM], 2);
        assert_eq!(audit.non_canonical, vec![(2, 768)]);
        assert_eq!(audit.blank, 1);
        assert!(!audit.is_clean());

        let report = audit.to_string();
        assert!(report.contains("768 dims: 1"));
        assert!(report.contains("row 2: 768 dims"));
    }

    #[test]
    fn test_clean_audit() {
        let mut audit = EmbeddingAudit::default();
        audit.record_vector(0, CANONICAL_EMBEDDING_DIM);
        assert!(audit.is_clean());
        assert!(audit.to_string().contains("All embeddings are 1536-dimensional"));
    }
}
