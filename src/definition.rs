//! Column definition improvement.
//!
//! A single-shot oracle call, independent of the abbreviation pipeline:
//! find the term row by its abbreviation, then ask the model to rewrite
//! the row's description.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::ColumnMapping;
use crate::error::{OracleError, OracleResult};
use crate::lexicon::Record;
use crate::oracle::prompts::definition_prompt;
use crate::oracle::{ChatParams, LlmClient};

/// Number of rows sampled into a [`DefinitionOutcome::NotFound`] report.
const SAMPLE_TERMS: usize = 10;

/// Result of [`DefinitionImprover::improve_term`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DefinitionOutcome {
    Improved {
        current: String,
        improved: String,
    },
    /// No row carries the abbreviation. The report helps diagnose a column
    /// mapping that does not match the workbook.
    NotFound {
        available_columns: Vec<String>,
        sample_terms: Vec<String>,
    },
    /// The row exists but its term name or description is blank.
    Incomplete,
    Failed {
        message: String,
    },
}

impl DefinitionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DefinitionOutcome::Improved { .. })
    }
}

pub struct DefinitionImprover {
    client: Arc<dyn LlmClient>,
    params: ChatParams,
}

impl DefinitionImprover {
    pub fn new(client: Arc<dyn LlmClient>, params: ChatParams) -> Self {
        Self { client, params }
    }

    /// Ask the model for an improved definition of one column.
    #[instrument(skip(self, current_definition))]
    pub async fn improve_definition(
        &self,
        abbreviation: &str,
        term_name: &str,
        current_definition: &str,
    ) -> OracleResult<String> {
        let prompt = definition_prompt(abbreviation, term_name, current_definition);
        let reply = self.client.chat(&prompt, &self.params).await?;
        let improved = reply.trim();
        if improved.is_empty() {
            return Err(OracleError::EmptyDefinition {
                abbreviation: abbreviation.to_string(),
            });
        }
        Ok(improved.to_string())
    }

    /// Look up the term row whose abbreviation column equals `abbreviation`
    /// and improve its description.
    #[instrument(skip(self, records, columns), fields(rows = records.len()))]
    pub async fn improve_term(
        &self,
        abbreviation: &str,
        records: &[Record],
        columns: &ColumnMapping,
    ) -> DefinitionOutcome {
        let Some(row) = records
            .iter()
            .find(|r| r.get(&columns.term_abbr) == Some(abbreviation))
        else {
            info!("term not found");
            return DefinitionOutcome::NotFound {
                available_columns: records
                    .first()
                    .map(|r| r.headers().map(str::to_string).collect())
                    .unwrap_or_default(),
                sample_terms: records
                    .iter()
                    .take(SAMPLE_TERMS)
                    .filter_map(|r| r.get_index(0))
                    .map(str::to_string)
                    .collect(),
            };
        };

        let term_name = row.get(&columns.term_name).unwrap_or_default();
        let current = row.get(&columns.term_desc).unwrap_or_default();
        if term_name.is_empty() || current.is_empty() {
            return DefinitionOutcome::Incomplete;
        }

        match self.improve_definition(abbreviation, term_name, current).await {
            Ok(improved) => DefinitionOutcome::Improved {
                current: current.to_string(),
                improved,
            },
            Err(e) => {
                warn!(error = %e, "definition improvement failed");
                DefinitionOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
