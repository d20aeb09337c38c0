//! Failure type for loading inputs and running the aggregation.
//!
//! Non-numeric or absent answer cells are not errors; they are skipped
//! where they are read. Everything here aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// A failure that aborts an aggregation run.
#[derive(Error, Debug)]
pub enum AggregationError {
    // === Input shape ===
    /// A catalog record lacks a required field.
    #[error("catalog record {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// A catalog field is present but is not a string.
    #[error("catalog record {index} has a non-text value for '{field}'")]
    InvalidField { index: usize, field: &'static str },

    /// The catalog is not a list of records.
    #[error("question catalog must be a JSON array of objects")]
    CatalogNotAList,

    /// Two catalog records share an id.
    #[error("duplicate question id '{id}' in catalog")]
    DuplicateQuestionId { id: String },

    /// A roster row has a blank respondent id.
    #[error("roster row {row} has an empty respondent id")]
    EmptyRespondentId { row: usize },

    /// A roster row uses an id that collides with a reserved output key.
    #[error("roster row {row} uses reserved respondent id '{id}'")]
    ReservedRespondentId { row: usize, id: String },

    /// No roster column matches the configured respondent column.
    #[error("roster has no respondent column (looked for: {})", candidates.join(", "))]
    MissingRespondentColumn { candidates: Vec<String> },

    /// A roster record could not be read.
    #[error("malformed roster record at line {line}: {detail}")]
    MalformedRecord { line: usize, detail: String },

    // === Loader ===
    /// Reading an input file failed.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl AggregationError {
    /// Whether this failure is about the shape of the inputs rather than
    /// reading them.
    pub fn is_input_shape(&self) -> bool {
        !matches!(self, AggregationError::Io { .. })
    }
}

/// Result alias for loading and aggregation.
pub type Result<T> = std::result::Result<T, AggregationError>;
