//! Lexicon - immutable in-memory term dictionary.
//!
//! The lexicon is built once (from a workbook export or a binary snapshot)
//! and then shared read-only via `Arc<Lexicon>`. It owns two independent
//! collections:
//! - term entries (word, abbreviation, optional embedding) for exact lookup
//!   and similarity search
//! - canonical compound abbreviations for permutation matching

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use super::types::{EmbeddingAudit, TermEntry};
use crate::error::LexiconError;

const SNAPSHOT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// SHA-256 over terms, abbreviations, embeddings and canonical list.
    pub hash: String,

    /// Version string for compatibility checking
    pub version: String,

    entries: Vec<TermEntry>,

    /// NFC term text → index of its first occurrence in `entries`.
    term_index: HashMap<String, usize>,

    canonical: Vec<String>,

    audit: EmbeddingAudit,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::empty()
    }
}

impl Lexicon {
    /// Create an empty lexicon (for testing)
    pub fn empty() -> Self {
        Self {
            hash: "empty".to_string(),
            version: SNAPSHOT_VERSION.to_string(),
            entries: Vec::new(),
            term_index: HashMap::new(),
            canonical: Vec::new(),
            audit: EmbeddingAudit::default(),
        }
    }

    /// Build a lexicon from parallel sequences.
    ///
    /// `terms` and `abbreviations` must have equal length. `embeddings` is
    /// aligned by position; a shorter sequence leaves the remaining entries
    /// without an embedding, a longer one is truncated.
    pub fn from_parts(
        terms: Vec<String>,
        abbreviations: Vec<String>,
        embeddings: Vec<Option<Vec<f32>>>,
        canonical: Vec<String>,
    ) -> Result<Self, LexiconError> {
        if terms.len() != abbreviations.len() {
            return Err(LexiconError::LengthMismatch {
                terms: terms.len(),
                abbreviations: abbreviations.len(),
            });
        }
        if embeddings.len() != terms.len() {
            tracing::warn!(
                terms = terms.len(),
                embeddings = embeddings.len(),
                "embedding count differs from term count; aligning by position"
            );
        }

        let mut embeddings = embeddings.into_iter();
        let entries = terms
            .into_iter()
            .zip(abbreviations)
            .map(|(term, abbreviation)| TermEntry {
                term,
                abbreviation,
                embedding: embeddings.next().flatten(),
            })
            .collect();

        Ok(Self::from_entries(entries, canonical))
    }

    /// Build a lexicon from already paired entries.
    pub fn from_entries(entries: Vec<TermEntry>, canonical: Vec<String>) -> Self {
        let mut term_index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            term_index.entry(index_key(&entry.term)).or_insert(i);
        }
        let hash = compute_hash(&entries, &canonical);

        Self {
            hash,
            version: SNAPSHOT_VERSION.to_string(),
            entries,
            term_index,
            canonical,
            audit: EmbeddingAudit::default(),
        }
    }

    pub(crate) fn with_audit(mut self, audit: EmbeddingAudit) -> Self {
        self.audit = audit;
        self
    }

    /// Load snapshot from binary file (bincode format).
    pub fn load_binary(path: &Path) -> Result<Self, LexiconError> {
        let bytes = std::fs::read(path).map_err(|e| LexiconError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let lexicon: Self = bincode::deserialize(&bytes).map_err(|e| {
            LexiconError::Snapshot(format!(
                "Failed to deserialize lexicon snapshot from {}: {}",
                path.display(),
                e
            ))
        })?;

        if lexicon.version != SNAPSHOT_VERSION {
            return Err(LexiconError::Snapshot(format!(
                "Snapshot version {} is not supported (expected {})",
                lexicon.version, SNAPSHOT_VERSION
            )));
        }

        Ok(lexicon)
    }

    /// Save snapshot to binary file (bincode format).
    pub fn save_binary(&self, path: &Path) -> Result<(), LexiconError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LexiconError::Io {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let bytes = bincode::serialize(self).map_err(|e| {
            LexiconError::Snapshot(format!(
                "Failed to serialize lexicon snapshot to {}: {}",
                path.display(),
                e
            ))
        })?;

        std::fs::write(path, bytes).map_err(|e| LexiconError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Exact term lookup. Duplicate term text resolves to the first entry.
    ///
    /// Both sides are compared in NFC, so decomposed Hangul from a workbook
    /// export matches composed input and vice versa.
    pub fn lookup_exact(&self, term: &str) -> Option<&TermEntry> {
        self.term_index.get(&index_key(term)).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[TermEntry] {
        &self.entries
    }

    pub fn canonical(&self) -> &[String] {
        &self.canonical
    }

    pub fn audit(&self) -> &EmbeddingAudit {
        &self.audit
    }

    /// Distinct term texts, in lexicon order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, e)| self.term_index.get(&index_key(&e.term)) == Some(i))
            .map(|(_, e)| e.term.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.canonical.is_empty()
    }

    pub fn stats(&self) -> LexiconStats {
        LexiconStats {
            hash: self.hash.clone(),
            version: self.version.clone(),
            entry_count: self.entries.len(),
            distinct_terms: self.term_index.len(),
            embedded_count: self
                .entries
                .iter()
                .filter(|e| e.embedding.is_some())
                .count(),
            canonical_count: self.canonical.len(),
        }
    }
}

fn index_key(term: &str) -> String {
    term.nfc().collect()
}

fn compute_hash(entries: &[TermEntry], canonical: &[String]) -> String {
    let mut hasher = Sha256::new();
    for entry in entries {
        hasher.update(entry.term.as_bytes());
        hasher.update([0x1f]);
        hasher.update(entry.abbreviation.as_bytes());
        hasher.update([0x1f]);
        if let Some(embedding) = &entry.embedding {
            for value in embedding {
                hasher.update(value.to_le_bytes());
            }
        }
        hasher.update([0x1e]);
    }
    hasher.update([0x1d]);
    for abbr in canonical {
        hasher.update(abbr.as_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}

/// Statistics about a lexicon.
#[derive(Debug, Clone)]
pub struct LexiconStats {
    pub hash: String,
    pub version: String,
    pub entry_count: usize,
    pub distinct_terms: usize,
    pub embedded_count: usize,
    pub canonical_count: usize,
}

impl std::fmt::Display for LexiconStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lexicon Statistics:")?;
        writeln!(f, "  Hash: {}", self.hash)?;
        writeln!(f, "  Version: {}", self.version)?;
        writeln!(f, "  Term entries: {}", self.entry_count)?;
        writeln!(f, "  Distinct terms: {}", self.distinct_terms)?;
        writeln!(f, "  Entries with embedding: {}", self.embedded_count)?;
        writeln!(f, "  Canonical abbreviations: {}", self.canonical_count)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_lexicon() {
        let lexicon = Lexicon::empty();
        assert_eq!(lexicon.hash, "empty");
        assert!(lexicon.is_empty());
        assert!(lexicon.lookup_exact("계좌").is_none());
    }

    #[test]
    fn test_from_parts_pairs_by_position() {
        let lexicon = Lexicon::from_parts(
            strings(&["계좌", "번호"]),
            strings(&["ACNT", "NO"]),
            vec![Some(vec![1.0, 0.0]), None],
            strings(&["ACNT_NO"]),
        )
        .unwrap();

        assert_eq!(lexicon.len(), 2);
        let entry = lexicon.lookup_exact("번호").unwrap();
        assert_eq!(entry.abbreviation, "NO");
        assert!(entry.embedding.is_none());
        assert_eq!(lexicon.canonical(), &["ACNT_NO".to_string()]);
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let result = Lexicon::from_parts(strings(&["계좌"]), vec![], vec![], vec![]);
        assert!(matches!(
            result,
            Err(LexiconError::LengthMismatch {
                terms: 1,
                abbreviations: 0
            })
        ));
    }

    #[test]
    fn test_short_embedding_list_pads_with_none() {
        let lexicon = Lexicon::from_parts(
            strings(&["계좌", "번호", "일자"]),
            strings(&["ACNT", "NO", "DT"]),
            vec![Some(vec![1.0])],
            vec![],
        )
        .unwrap();

        assert!(lexicon.entries()[0].embedding.is_some());
        assert!(lexicon.entries()[1].embedding.is_none());
        assert!(lexicon.entries()[2].embedding.is_none());
        assert_eq!(lexicon.lookup_exact("일자").unwrap().abbreviation, "DT");
    }

    #[test]
    fn test_duplicate_term_resolves_to_first_occurrence() {
        let lexicon = Lexicon::from_parts(
            strings(&["번호", "번호"]),
            strings(&["NO", "NUM"]),
            vec![],
            vec![],
        )
        .unwrap();

        assert_eq!(lexicon.lookup_exact("번호").unwrap().abbreviation, "NO");
        assert_eq!(lexicon.terms().collect::<Vec<_>>(), vec!["번호"]);
        assert_eq!(lexicon.stats().distinct_terms, 1);
        assert_eq!(lexicon.stats().entry_count, 2);
    }

    #[test]
    fn test_lookup_ignores_normalization_form() {
        let decomposed: String = "계좌".nfd().collect();
        let lexicon = Lexicon::from_parts(
            vec![decomposed.clone()],
            strings(&["ACNT"]),
            vec![],
            vec![],
        )
        .unwrap();

        assert_eq!(lexicon.lookup_exact("계좌").unwrap().abbreviation, "ACNT");
        assert_eq!(lexicon.lookup_exact(&decomposed).unwrap().abbreviation, "ACNT");
        assert_eq!(lexicon.terms().count(), 1);
        assert_eq!(lexicon.stats().distinct_terms, 1);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let build = || {
            Lexicon::from_parts(
                strings(&["계좌"]),
                strings(&["ACNT"]),
                vec![Some(vec![0.5, 0.5])],
                strings(&["ACNT_NO"]),
            )
            .unwrap()
        };
        assert_eq!(build().hash, build().hash);

        let other = Lexicon::from_parts(
            strings(&["계좌"]),
            strings(&["ACCT"]),
            vec![Some(vec![0.5, 0.5])],
            strings(&["ACNT_NO"]),
        )
        .unwrap();
        assert_ne!(build().hash, other.hash);
    }

    #[test]
    fn test_save_and_load_binary() {
        let lexicon = Lexicon::from_parts(
            strings(&["계좌", "번호"]),
            strings(&["ACNT", "NO"]),
            vec![Some(vec![0.1, 0.2, 0.3]), None],
            strings(&["ACNT_NO"]),
        )
        .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshots/lexicon.bin");

        lexicon.save_binary(&path).unwrap();
        assert!(path.exists());

        let loaded = Lexicon::load_binary(&path).unwrap();
        assert_eq!(loaded.hash, lexicon.hash);
        assert_eq!(loaded.lookup_exact("계좌").unwrap().abbreviation, "ACNT");
        assert_eq!(loaded.canonical(), lexicon.canonical());
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = tempdir().unwrap();
        let result = Lexicon::load_binary(&dir.path().join("missing.bin"));
        assert!(matches!(result, Err(LexiconError::Io { .. })));
    }
}
