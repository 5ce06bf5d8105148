//! Workbook export reader.
//!
//! The term dictionary lives in a spreadsheet. This module reads an export
//! of that spreadsheet in YAML or JSON (chosen by file extension):
//!
//! ```yaml
//! sheets:
//!   - name: 공통표준용어
//!     headers: [공통표준용어명, 공통표준용어설명, 공통표준도메인명, 공통표준용어영문약어명]
//!     rows:
//!       - [계좌번호, 계좌를 식별하는 번호., 번호, ACNT_NO]
//!   - name: 공통표준단어
//!     headers: [공통표준단어명, 공통표준단어영문약어명, embedding]
//!     rows:
//!       - [계좌, ACNT, "0.013, -0.021, ..."]
//! ```
//!
//! Rows whose cells are all blank are dropped. Cells may be strings, numbers,
//! booleans or null; they are read back as trimmed text.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LexiconError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

/// One non-blank sheet row as ordered `(header, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(header, _)| header == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(header, _)| header.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Workbook {
    /// Load a workbook export, YAML unless the extension is `.json`.
    pub fn load(path: &Path) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|e| LexiconError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let workbook = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };

        workbook.map_err(|message| LexiconError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Sheet by zero-based position.
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_named(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl Sheet {
    /// Non-blank rows keyed by header. Short rows are padded with "".
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| Record {
                fields: self
                    .headers
                    .iter()
                    .enumerate()
                    .map(|(i, header)| {
                        let value = row.get(i).map(cell_text).unwrap_or_default();
                        (header.clone(), value)
                    })
                    .collect(),
            })
            .filter(|record| record.fields.iter().any(|(_, v)| !v.is_empty()))
            .collect()
    }

    /// Column position by header name.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell text of one column for every row, blank rows included, so the
    /// result stays aligned with row positions.
    pub fn column(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(index).map(cell_text).unwrap_or_default())
            .collect()
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Result of parsing one embedding cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingCell {
    Vector(Vec<f32>),
    /// Empty cell or a `-` placeholder.
    Blank,
    Malformed(String),
}

/// Parse comma-separated embedding text such as `"0.12, -0.03, 0.5"`.
///
/// Surrounding brackets are accepted. Text without a comma is not an
/// embedding.
pub fn parse_embedding(text: &str) -> EmbeddingCell {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return EmbeddingCell::Blank;
    }
    if !text.contains(',') {
        return EmbeddingCell::Malformed("no comma-separated values".to_string());
    }

    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text);

    let mut values = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        match part.parse::<f32>() {
            Ok(v) if v.is_finite() => values.push(v),
            Ok(v) => return EmbeddingCell::Malformed(format!("non-finite value {}", v)),
            Err(e) => return EmbeddingCell::Malformed(format!("'{}': {}", part, e)),
        }
    }
    EmbeddingCell::Vector(values)
}
