//! Question catalog loading.
//!
//! The catalog is a JSON array of question records. Both the canonical
//! field names and the legacy export names are accepted.

use crate::analysis::validate_inputs;
use crate::error::{AggregationError, Result};
use crate::models::QuestionDef;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const ID_FIELDS: &[&str] = &["id", "q#"];
const TEXT_FIELDS: &[&str] = &["text", "question"];
const CATEGORY_FIELDS: &[&str] = &["category", "cat", "Category/Pathway"];
const SUBCATEGORY_FIELDS: &[&str] = &["subcategory", "subcat", "Subcategory/Competence"];

/// Load and validate a question catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<Vec<QuestionDef>> {
    let content = fs::read_to_string(path).map_err(|source| AggregationError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let catalog = parse_catalog(&content)?;
    info!("Loaded {} questions from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Parse and validate a question catalog from JSON text.
pub fn parse_catalog(content: &str) -> Result<Vec<QuestionDef>> {
    let value: Value = serde_json::from_str(content)?;
    let records = value.as_array().ok_or(AggregationError::CatalogNotAList)?;

    let catalog = records
        .iter()
        .enumerate()
        .map(|(index, record)| -> Result<QuestionDef> {
            let object = record.as_object().ok_or(AggregationError::CatalogNotAList)?;
            Ok(QuestionDef {
                id: field(object, index, "id", ID_FIELDS)?,
                text: field(object, index, "text", TEXT_FIELDS)?,
                category: field(object, index, "category", CATEGORY_FIELDS)?,
                subcategory: field(object, index, "subcategory", SUBCATEGORY_FIELDS)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    validate_inputs(&catalog, &[])?;
    debug!("Parsed {} catalog records", catalog.len());

    Ok(catalog)
}

fn field(
    object: &Map<String, Value>,
    index: usize,
    name: &'static str,
    keys: &[&str],
) -> Result<String> {
    match keys.iter().find_map(|key| object.get(*key)) {
        None | Some(Value::Null) => Err(AggregationError::MissingField { index, field: name }),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(AggregationError::InvalidField { index, field: name }),
    }
}
