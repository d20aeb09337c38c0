//! Answer aggregation.
//!
//! Folds raw roster rows into per-respondent, per-question statistics.

use crate::models::{AnswerRow, Stat, Tally};
use indexmap::IndexMap;
use tracing::debug;

/// Per-respondent stats keyed by respondent id, then question id.
pub type RespondentStats = IndexMap<String, IndexMap<String, Stat>>;

/// Parse one answer cell as a scale value.
///
/// Only a run of ASCII digits (surrounding whitespace allowed) that fits in
/// a `u64` counts. Anything else is skipped by the caller.
pub fn parse_scale_value(cell: &str) -> Option<u64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Aggregate answer rows into per-respondent, per-question stats.
///
/// Every respondent that appears in `rows` gets an entry, even one with no
/// scored answers. A question with no scored answer for a respondent has no
/// entry at all; it is never a zero stat here.
pub fn aggregate_answers(rows: &[AnswerRow]) -> RespondentStats {
    let mut tallies: IndexMap<String, IndexMap<String, Tally>> = IndexMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let per_question = tallies.entry(row.respondent_id.clone()).or_default();

        for (question_id, cell) in &row.answers {
            match parse_scale_value(cell) {
                Some(value) => per_question
                    .entry(question_id.clone())
                    .or_default()
                    .record(value),
                None => skipped += 1,
            }
        }
    }

    debug!(
        "Aggregated {} rows into {} respondents ({} cells skipped)",
        rows.len(),
        tallies.len(),
        skipped
    );

    tallies
        .into_iter()
        .map(|(respondent, questions)| {
            let stats = questions
                .into_iter()
                .map(|(question_id, tally)| (question_id, tally.finish()))
                .collect();
            (respondent, stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scale_value() {
        assert_eq!(parse_scale_value("4"), Some(4));
        assert_eq!(parse_scale_value(" 12 "), Some(12));
        assert_eq!(parse_scale_value("0"), Some(0));
        assert_eq!(parse_scale_value("N/A"), None);
        assert_eq!(parse_scale_value(""), None);
        assert_eq!(parse_scale_value("-1"), None);
        assert_eq!(parse_scale_value("+3"), None);
        assert_eq!(parse_scale_value("2.5"), None);
        assert_eq!(parse_scale_value("99999999999999999999999"), None);
    }

    #[test]
    fn test_aggregate_single_answers() {
        let rows = vec![
            AnswerRow::new("Smith").with_answer("Q1", "4"),
            AnswerRow::new("Jones").with_answer("Q1", "2"),
        ];

        let stats = aggregate_answers(&rows);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats["Smith"]["Q1"], Stat::new(1, 4));
        assert_eq!(stats["Jones"]["Q1"].average(), 2.0);
    }

    #[test]
    fn test_repeated_respondent_rows_fold_together() {
        let rows = vec![
            AnswerRow::new("Smith").with_answer("Q1", "4"),
            AnswerRow::new("Smith").with_answer("Q1", "1"),
        ];

        let stats = aggregate_answers(&rows);

        assert_eq!(stats.len(), 1);
        let q1 = stats["Smith"]["Q1"];
        assert_eq!(q1.count(), 2);
        assert_eq!(q1.sum(), 5);
        assert_eq!(q1.average(), 2.5);
    }

    #[test]
    fn test_unparseable_cell_leaves_question_absent() {
        let rows = vec![AnswerRow::new("Smith")
            .with_answer("Q1", "N/A")
            .with_answer("Q2", "3")];

        let stats = aggregate_answers(&rows);

        assert!(stats["Smith"].get("Q1").is_none());
        assert_eq!(stats["Smith"]["Q2"], Stat::new(1, 3));
    }

    #[test]
    fn test_respondent_without_scored_answers_is_kept() {
        let rows = vec![AnswerRow::new("Lee").with_answer("Q1", "")];

        let stats = aggregate_answers(&rows);

        assert!(stats.contains_key("Lee"));
        assert!(stats["Lee"].is_empty());
    }

    #[test]
    fn test_respondents_keep_first_seen_order() {
        let rows = vec![
            AnswerRow::new("Zed").with_answer("Q1", "1"),
            AnswerRow::new("Amy").with_answer("Q1", "1"),
            AnswerRow::new("Zed").with_answer("Q2", "1"),
        ];

        let stats = aggregate_answers(&rows);
        let order: Vec<_> = stats.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_answers(&[]).is_empty());
    }
}
