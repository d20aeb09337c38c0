//! Read-only summaries of an aggregation result.
//!
//! These helpers never change a result; the report generator uses them to
//! lay out tables.

use crate::models::{AggregationResult, Stat, SubcategoryBucket};
use indexmap::IndexSet;

/// Respondent × subcategory grid of averages.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    /// Respondent ids, in first-seen order.
    pub rows: Vec<String>,
    /// Subcategory labels, in first-seen order.
    pub columns: Vec<String>,
    /// `cells[row][column]`; `None` where the respondent has no entry.
    pub cells: Vec<Vec<Option<f64>>>,
}

/// One respondent's position within a single subcategory.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing<'a> {
    pub respondent: &'a str,
    pub stat: Stat,
    /// Subcategory rank of this respondent (their own subcategories, 1..k).
    pub rank: u32,
    /// 1-based position among the bucket's respondents by average.
    pub position: usize,
}

/// All respondent ids in the result, in first-seen order.
pub fn respondent_ids(result: &AggregationResult) -> Vec<String> {
    let mut ids: IndexSet<&str> = IndexSet::new();
    for question in &result.questions {
        ids.extend(question.entities.respondents.keys().map(String::as_str));
    }
    for bucket in result.by_subcategory.values() {
        ids.extend(bucket.respondents.keys().map(String::as_str));
    }
    ids.into_iter().map(String::from).collect()
}

/// Number of answers that were counted across all questions.
pub fn answered_cells(result: &AggregationResult) -> u64 {
    result
        .questions
        .iter()
        .map(|q| q.entities.total.count())
        .sum()
}

/// Build the respondent × subcategory heatmap.
pub fn heatmap(result: &AggregationResult) -> Heatmap {
    let rows = respondent_ids(result);
    let columns: Vec<String> = result.by_subcategory.keys().cloned().collect();

    let cells = rows
        .iter()
        .map(|respondent| {
            result
                .by_subcategory
                .values()
                .map(|bucket| {
                    bucket
                        .respondents
                        .get(respondent)
                        .map(|entry| entry.stat.average())
                })
                .collect()
        })
        .collect();

    Heatmap {
        rows,
        columns,
        cells,
    }
}

/// Subcategories with answers, highest total average first.
pub fn strongest_subcategories(
    result: &AggregationResult,
    n: usize,
) -> Vec<(&str, &SubcategoryBucket)> {
    let mut ranked = answered_subcategories(result);
    ranked.sort_by(|a, b| {
        b.1.total
            .average()
            .total_cmp(&a.1.total.average())
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.truncate(n);
    ranked
}

/// Subcategories with answers, lowest total average first.
pub fn weakest_subcategories(
    result: &AggregationResult,
    n: usize,
) -> Vec<(&str, &SubcategoryBucket)> {
    let mut ranked = answered_subcategories(result);
    ranked.sort_by(|a, b| {
        a.1.total
            .average()
            .total_cmp(&b.1.total.average())
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.truncate(n);
    ranked
}

fn answered_subcategories(result: &AggregationResult) -> Vec<(&str, &SubcategoryBucket)> {
    result
        .by_subcategory
        .iter()
        .filter(|(_, bucket)| bucket.total.count() > 0)
        .map(|(label, bucket)| (label.as_str(), bucket))
        .collect()
}

/// Order a subcategory's respondents by average, highest first.
///
/// Equal averages are ordered by respondent id so the listing is stable.
pub fn standings(bucket: &SubcategoryBucket) -> Vec<Standing<'_>> {
    let mut entries: Vec<_> = bucket.respondents.iter().collect();
    entries.sort_by(|a, b| {
        b.1.stat
            .average()
            .total_cmp(&a.1.stat.average())
            .then_with(|| a.0.cmp(b.0))
    });

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (respondent, entry))| Standing {
            respondent: respondent.as_str(),
            stat: entry.stat,
            rank: entry.rank,
            position: index + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::run;
    use crate::models::{AnswerRow, QuestionDef, TieBreak};

    fn result() -> AggregationResult {
        let catalog = vec![
            QuestionDef::new("Q1", "a", "Roles", "Clarity"),
            QuestionDef::new("Q2", "b", "Roles", "Fairness"),
            QuestionDef::new("Q3", "c", "Communication", "Frequency"),
        ];
        let rows = vec![
            AnswerRow::new("Smith")
                .with_answer("Q1", "4")
                .with_answer("Q2", "1"),
            AnswerRow::new("Jones")
                .with_answer("Q1", "2")
                .with_answer("Q2", "3"),
        ];
        run(&catalog, &rows, TieBreak::Label).unwrap()
    }

    #[test]
    fn test_respondent_ids() {
        assert_eq!(respondent_ids(&result()), vec!["Smith", "Jones"]);
    }

    #[test]
    fn test_answered_cells() {
        assert_eq!(answered_cells(&result()), 4);
    }

    #[test]
    fn test_heatmap_shape() {
        let map = heatmap(&result());

        assert_eq!(map.columns, vec!["Clarity", "Fairness", "Frequency"]);
        assert_eq!(map.rows, vec!["Smith", "Jones"]);
        assert_eq!(map.cells[0][0], Some(4.0));
        assert_eq!(map.cells[1][1], Some(3.0));
        assert_eq!(map.cells[1][2], Some(0.0));
    }

    #[test]
    fn test_strongest_and_weakest_skip_unanswered() {
        let result = result();

        let strongest = strongest_subcategories(&result, 5);
        let labels: Vec<_> = strongest.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["Clarity", "Fairness"]);

        let weakest = weakest_subcategories(&result, 1);
        assert_eq!(weakest[0].0, "Fairness");
    }

    #[test]
    fn test_standings_order_respondents() {
        let result = result();
        let clarity = standings(&result.by_subcategory["Clarity"]);

        assert_eq!(clarity[0].respondent, "Smith");
        assert_eq!(clarity[0].position, 1);
        assert_eq!(clarity[1].respondent, "Jones");
        assert_eq!(clarity[1].position, 2);
        assert_eq!(clarity[1].stat.average(), 2.0);
    }

    #[test]
    fn test_standings_ties_by_respondent_id() {
        let catalog = vec![QuestionDef::new("Q1", "a", "Roles", "Clarity")];
        let rows = vec![
            AnswerRow::new("Zed").with_answer("Q1", "3"),
            AnswerRow::new("Amy").with_answer("Q1", "3"),
        ];
        let result = run(&catalog, &rows, TieBreak::Label).unwrap();

        let order: Vec<_> = standings(&result.by_subcategory["Clarity"])
            .into_iter()
            .map(|s| s.respondent)
            .collect();
        assert_eq!(order, vec!["Amy", "Zed"]);
    }
}
