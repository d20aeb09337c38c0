//! Aggregation pipeline.
//!
//! Data flows strictly aggregator → enricher → roll-up → ranker. Each stage
//! fully consumes the previous one and returns fresh structures, so a run
//! holds no state beyond its own inputs.

pub mod aggregator;
pub mod enricher;
pub mod insights;
pub mod ranker;
pub mod rollup;

pub use aggregator::{aggregate_answers, parse_scale_value, RespondentStats};
pub use enricher::enrich;
pub use insights::{
    answered_cells, heatmap, respondent_ids, standings, strongest_subcategories,
    weakest_subcategories, Heatmap, Standing,
};
pub use ranker::rank;
pub use rollup::{roll_up, CategoryBuckets, SubcategoryBuckets};

use crate::error::{AggregationError, Result};
use crate::models::{is_reserved_key, AggregationResult, AnswerRow, QuestionDef, TieBreak};
use std::collections::HashSet;
use tracing::info;

/// Run the full pipeline over a catalog and its answer rows.
///
/// Input-shape problems abort before any stage runs. Empty inputs are not
/// an error and produce zeroed or empty structures.
pub fn run(
    catalog: &[QuestionDef],
    rows: &[AnswerRow],
    tie_break: TieBreak,
) -> Result<AggregationResult> {
    validate_inputs(catalog, rows)?;

    let per_respondent = aggregate_answers(rows);
    let questions = enrich(catalog, &per_respondent);
    let (by_category, by_subcategory) = roll_up(&questions);
    let by_subcategory = rank(by_subcategory, tie_break);

    info!(
        "Aggregated {} respondents over {} questions ({} categories, {} subcategories)",
        per_respondent.len(),
        questions.len(),
        by_category.len(),
        by_subcategory.len()
    );

    Ok(AggregationResult {
        questions,
        by_category,
        by_subcategory,
    })
}

/// Check the catalog and rows for shape problems.
pub fn validate_inputs(catalog: &[QuestionDef], rows: &[AnswerRow]) -> Result<()> {
    let mut seen = HashSet::with_capacity(catalog.len());

    for (index, question) in catalog.iter().enumerate() {
        let required = [
            ("id", &question.id),
            ("category", &question.category),
            ("subcategory", &question.subcategory),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AggregationError::MissingField { index, field });
            }
        }

        if !seen.insert(question.id.as_str()) {
            return Err(AggregationError::DuplicateQuestionId {
                id: question.id.clone(),
            });
        }
    }

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        if row.respondent_id.trim().is_empty() {
            return Err(AggregationError::EmptyRespondentId { row: row_number });
        }
        if is_reserved_key(&row.respondent_id) {
            return Err(AggregationError::ReservedRespondentId {
                row: row_number,
                id: row.respondent_id.clone(),
            });
        }
    }

    Ok(())
}
