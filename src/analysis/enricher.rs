//! Question enrichment.
//!
//! Merges the catalog with per-respondent stats, producing one record per
//! question with an entity for every respondent plus a `total`.

use super::aggregator::RespondentStats;
use crate::models::{EnrichedQuestion, QuestionDef, QuestionEntities, Stat, Tally};
use indexmap::IndexMap;
use tracing::debug;

/// Enrich every catalog question with respondent entities, in catalog order.
///
/// A respondent with no stat for a question gets [`Stat::zero`], so "never
/// answered" and "no scored entry" look the same downstream. Stats for
/// question ids that are not in the catalog are never looked up.
pub fn enrich(catalog: &[QuestionDef], per_respondent: &RespondentStats) -> Vec<EnrichedQuestion> {
    let enriched: Vec<EnrichedQuestion> = catalog
        .iter()
        .map(|question| EnrichedQuestion {
            question: question.clone(),
            entities: question_entities(&question.id, per_respondent),
        })
        .collect();

    debug!(
        "Enriched {} questions across {} respondents",
        enriched.len(),
        per_respondent.len()
    );

    enriched
}

fn question_entities(question_id: &str, per_respondent: &RespondentStats) -> QuestionEntities {
    let mut respondents = IndexMap::with_capacity(per_respondent.len());
    let mut total = Tally::default();

    for (respondent, answers) in per_respondent {
        let stat = answers.get(question_id).copied().unwrap_or_else(Stat::zero);
        total.absorb(&stat);
        respondents.insert(respondent.clone(), stat);
    }

    QuestionEntities {
        respondents,
        total: total.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate_answers;
    use crate::models::AnswerRow;

    fn catalog() -> Vec<QuestionDef> {
        vec![
            QuestionDef::new("Q1", "Roles are clear", "Roles", "Clarity"),
            QuestionDef::new("Q2", "We talk often", "Communication", "Frequency"),
        ]
    }

    #[test]
    fn test_total_from_final_sums() {
        let rows = vec![
            AnswerRow::new("Smith").with_answer("Q1", "4"),
            AnswerRow::new("Jones").with_answer("Q1", "2"),
        ];
        let enriched = enrich(&catalog(), &aggregate_answers(&rows));

        let total = enriched[0].entities.total;
        assert_eq!(total, Stat::new(2, 6));
        assert_eq!(total.average(), 3.0);
    }

    #[test]
    fn test_missing_answer_substitutes_zero_stat() {
        let rows = vec![
            AnswerRow::new("Smith").with_answer("Q1", "4"),
            AnswerRow::new("Jones").with_answer("Q2", "5"),
        ];
        let enriched = enrich(&catalog(), &aggregate_answers(&rows));

        assert_eq!(enriched[0].entities.respondents["Jones"], Stat::zero());
        assert_eq!(enriched[1].entities.respondents["Smith"], Stat::zero());
        assert_eq!(enriched[1].entities.total, Stat::new(1, 5));
    }

    #[test]
    fn test_preserves_catalog_order() {
        let mut questions = catalog();
        questions.reverse();
        let enriched = enrich(&questions, &RespondentStats::new());

        let ids: Vec<_> = enriched.iter().map(|q| q.question.id.as_str()).collect();
        assert_eq!(ids, vec!["Q2", "Q1"]);
    }

    #[test]
    fn test_unknown_question_ids_contribute_nothing() {
        let rows = vec![AnswerRow::new("Smith")
            .with_answer("Q1", "4")
            .with_answer("Q99", "5")];
        let enriched = enrich(&catalog(), &aggregate_answers(&rows));

        assert_eq!(enriched.len(), 2);
        let grand: u128 = enriched.iter().map(|q| q.entities.total.sum()).sum();
        assert_eq!(grand, 4);
    }

    #[test]
    fn test_no_respondents_yields_zero_totals() {
        let enriched = enrich(&catalog(), &RespondentStats::new());

        for question in &enriched {
            assert!(question.entities.respondents.is_empty());
            assert_eq!(question.entities.total, Stat::zero());
        }
    }
}
