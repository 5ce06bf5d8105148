//! LexiconCompiler - build a [`Lexicon`] from workbook exports.
//!
//! ## Build Process
//!
//! 1. Sheet 1 (term sheet): collect canonical compound abbreviations
//! 2. Sheet 2 (word sheet, optional): collect (word, abbreviation) pairs
//! 3. Parse the embedding column, aligned with the word sheet by row
//!    position, and audit dimensionality
//! 4. Assemble the immutable lexicon and its content hash
//!
//! ## Usage
//!
//! ```rust,ignore
//! let compiler = LexiconCompiler::new(ColumnMapping::default());
//! let lexicon = compiler.build_from_files(Path::new("terms.yaml"), Some(Path::new("embeddings.yaml")))?;
//! lexicon.save_binary(Path::new("assets/lexicon.bin"))?;
//! ```

use std::path::Path;

use super::snapshot::Lexicon;
use super::types::EmbeddingAudit;
use super::workbook::{parse_embedding, EmbeddingCell, Sheet, Workbook};
use crate::config::ColumnMapping;
use crate::error::LexiconError;

pub const DEFAULT_EMBEDDING_SHEET: &str = "공통표준단어";
pub const DEFAULT_EMBEDDING_COLUMN: &str = "embedding";

/// Fallback position of the abbreviation column in the term sheet.
const TERM_ABBR_POSITION: usize = 3;

pub struct LexiconCompiler {
    columns: ColumnMapping,
    embedding_sheet: String,
    embedding_column: String,
}

impl Default for LexiconCompiler {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}

impl LexiconCompiler {
    pub fn new(columns: ColumnMapping) -> Self {
        Self {
            columns,
            embedding_sheet: DEFAULT_EMBEDDING_SHEET.to_string(),
            embedding_column: DEFAULT_EMBEDDING_COLUMN.to_string(),
        }
    }

    pub fn with_embedding_source(mut self, sheet: &str, column: &str) -> Self {
        self.embedding_sheet = sheet.to_string();
        self.embedding_column = column.to_string();
        self
    }

    /// Load the workbook exports from disk and build the lexicon.
    pub fn build_from_files(
        &self,
        workbook_path: &Path,
        embedding_path: Option<&Path>,
    ) -> Result<Lexicon, LexiconError> {
        let workbook = Workbook::load(workbook_path)?;
        let embeddings = embedding_path.map(Workbook::load).transpose()?;
        self.build(&workbook, embeddings.as_ref())
    }

    /// Build the lexicon.
    ///
    /// A missing term sheet, or a workbook yielding neither words nor
    /// canonical abbreviations, is fatal. Missing or malformed embeddings are
    /// not: affected words stay available for exact lookup only.
    pub fn build(
        &self,
        workbook: &Workbook,
        embedding_workbook: Option<&Workbook>,
    ) -> Result<Lexicon, LexiconError> {
        let term_sheet = workbook.sheet(0).ok_or_else(|| LexiconError::MissingSheet {
            sheet: "sheet1".to_string(),
        })?;
        let canonical = self.canonical_abbreviations(term_sheet);
        tracing::info!(
            sheet = %term_sheet.name,
            rows = term_sheet.rows.len(),
            canonical = canonical.len(),
            "loaded term sheet"
        );

        let words = match workbook.sheet(1) {
            Some(sheet) => {
                let words = self.word_rows(sheet);
                tracing::info!(sheet = %sheet.name, words = words.len(), "loaded word sheet");
                words
            }
            None => {
                tracing::warn!("workbook has no second sheet; word dictionary is empty");
                Vec::new()
            }
        };

        if words.is_empty() && canonical.is_empty() {
            return Err(LexiconError::Empty);
        }

        let embedding_cells = self.embedding_cells(workbook.sheet(1), embedding_workbook);
        let (embeddings, audit) = parse_embedding_column(&words, &embedding_cells);
        audit.log();

        let (terms, abbreviations): (Vec<String>, Vec<String>) = words
            .into_iter()
            .map(|word| (word.term, word.abbreviation))
            .unzip();
        let lexicon =
            Lexicon::from_parts(terms, abbreviations, embeddings, canonical)?.with_audit(audit);

        tracing::info!(
            hash = %lexicon.hash,
            entries = lexicon.len(),
            "lexicon compiled"
        );
        Ok(lexicon)
    }

    fn canonical_abbreviations(&self, sheet: &Sheet) -> Vec<String> {
        let index = sheet
            .column_index(&self.columns.term_abbr)
            .unwrap_or(TERM_ABBR_POSITION);
        sheet
            .column(index)
            .into_iter()
            .filter(|abbr| !abbr.is_empty())
            .collect()
    }

    /// Word and abbreviation columns, by header name or else the first two
    /// columns. Rows where both are blank are skipped; the rest keep their
    /// sheet position for embedding alignment.
    fn word_rows(&self, sheet: &Sheet) -> Vec<WordRow> {
        if sheet.headers.len() < 2 {
            tracing::warn!(sheet = %sheet.name, "word sheet has fewer than two columns");
            return Vec::new();
        }
        let names = sheet.column(sheet.column_index(&self.columns.word_name).unwrap_or(0));
        let abbrs = sheet.column(sheet.column_index(&self.columns.word_abbr).unwrap_or(1));

        names
            .into_iter()
            .zip(abbrs)
            .enumerate()
            .filter(|(_, (term, abbreviation))| !term.is_empty() || !abbreviation.is_empty())
            .map(|(row, (term, abbreviation))| WordRow {
                row,
                term,
                abbreviation,
            })
            .collect()
    }

    /// Embedding cell text per sheet row, blank rows included.
    ///
    /// Taken from the dedicated embedding workbook when one is given,
    /// otherwise from an embedding column on the word sheet itself.
    fn embedding_cells(
        &self,
        word_sheet: Option<&Sheet>,
        embedding_workbook: Option<&Workbook>,
    ) -> Vec<String> {
        let sheet = match embedding_workbook {
            Some(workbook) => match workbook.sheet_named(&self.embedding_sheet) {
                Some(sheet) => sheet,
                None => {
                    tracing::warn!(
                        sheet = %self.embedding_sheet,
                        "embedding sheet not found; similarity search disabled"
                    );
                    return Vec::new();
                }
            },
            None => match word_sheet {
                Some(sheet) => sheet,
                None => return Vec::new(),
            },
        };

        let Some(index) = sheet.column_index(&self.embedding_column) else {
            if embedding_workbook.is_some() {
                tracing::warn!(
                    sheet = %sheet.name,
                    column = %self.embedding_column,
                    "embedding column not found; similarity search disabled"
                );
            }
            return Vec::new();
        };

        if let (Some(words), Some(_)) = (word_sheet, embedding_workbook) {
            if words.rows.len() != sheet.rows.len() {
                tracing::warn!(
                    embedding_rows = sheet.rows.len(),
                    word_rows = words.rows.len(),
                    "embedding rows do not line up with word rows"
                );
            }
        }
        sheet.column(index)
    }
}

/// One word sheet row that carries a word or an abbreviation.
#[derive(Debug)]
struct WordRow {
    /// Zero-based row position in the sheet.
    row: usize,
    term: String,
    abbreviation: String,
}

/// Parse the embedding cell at each word's sheet row. Audit entries carry
/// the sheet row.
fn parse_embedding_column(
    words: &[WordRow],
    cells: &[String],
) -> (Vec<Option<Vec<f32>>>, EmbeddingAudit) {
    let mut audit = EmbeddingAudit::default();
    let embeddings = words
        .iter()
        .map(|word| {
            let text = cells.get(word.row).map(String::as_str).unwrap_or_default();
            match parse_embedding(text) {
                EmbeddingCell::Vector(v) => {
                    audit.record_vector(word.row, v.len());
                    Some(v)
                }
                EmbeddingCell::Blank => {
                    audit.record_blank();
                    None
                }
                EmbeddingCell::Malformed(reason) => {
                    audit.record_malformed(word.row, reason);
                    None
                }
            }
        })
        .collect();
    (embeddings, audit)
}
