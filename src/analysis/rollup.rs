//! Category and subcategory roll-up.
//!
//! Re-aggregates enriched questions into coarser buckets. Each bucket holds
//! one stat per respondent and a `total` summed from those stats.

use crate::models::{
    CategoryBucket, EnrichedQuestion, RankedStat, Stat, SubcategoryBucket, Tally,
};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Category buckets keyed by category label, in first-seen order.
pub type CategoryBuckets = IndexMap<String, CategoryBucket>;

/// Subcategory buckets keyed by subcategory label, in first-seen order.
pub type SubcategoryBuckets = IndexMap<String, SubcategoryBucket>;

/// Roll enriched questions up by category and by subcategory.
///
/// Subcategories are expected to belong to a single category. When they do
/// not, the bucket keeps the category of the first question seen.
/// Subcategory entries come back unranked.
pub fn roll_up(enriched: &[EnrichedQuestion]) -> (CategoryBuckets, SubcategoryBuckets) {
    let mut categories: IndexMap<String, IndexMap<String, Tally>> = IndexMap::new();
    let mut subcategories: IndexMap<String, (String, IndexMap<String, Tally>)> = IndexMap::new();

    for question in enriched {
        let def = &question.question;

        let category_slots = categories.entry(def.category.clone()).or_default();
        let (parent, subcategory_slots) = subcategories
            .entry(def.subcategory.clone())
            .or_insert_with(|| (def.category.clone(), IndexMap::new()));

        if *parent != def.category {
            warn!(
                "Question {} puts subcategory '{}' under '{}', keeping '{}'",
                def.id, def.subcategory, def.category, parent
            );
        }

        for (respondent, stat) in &question.entities.respondents {
            category_slots
                .entry(respondent.clone())
                .or_default()
                .absorb(stat);
            subcategory_slots
                .entry(respondent.clone())
                .or_default()
                .absorb(stat);
        }
    }

    let by_category: CategoryBuckets = categories
        .into_iter()
        .map(|(label, slots)| {
            let respondents = finish_slots(slots);
            let total = total_of(respondents.values());
            (label, CategoryBucket { respondents, total })
        })
        .collect();

    let by_subcategory: SubcategoryBuckets = subcategories
        .into_iter()
        .map(|(label, (category, slots))| {
            let stats = finish_slots(slots);
            let total = total_of(stats.values());
            let respondents = stats
                .into_iter()
                .map(|(respondent, stat)| (respondent, RankedStat::unranked(stat)))
                .collect();
            (
                label,
                SubcategoryBucket {
                    category,
                    respondents,
                    total,
                },
            )
        })
        .collect();

    debug!(
        "Rolled {} questions into {} categories and {} subcategories",
        enriched.len(),
        by_category.len(),
        by_subcategory.len()
    );

    (by_category, by_subcategory)
}

fn finish_slots(slots: IndexMap<String, Tally>) -> IndexMap<String, Stat> {
    slots
        .into_iter()
        .map(|(respondent, tally)| (respondent, tally.finish()))
        .collect()
}

/// Sum a bucket's respondent stats, deriving the average from the final sums.
fn total_of<'a>(stats: impl IntoIterator<Item = &'a Stat>) -> Stat {
    let mut total = Tally::default();
    for stat in stats {
        total.absorb(stat);
    }
    total.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate_answers, enrich};
    use crate::models::{AnswerRow, QuestionDef};

    fn enriched_fixture() -> Vec<EnrichedQuestion> {
        let catalog = vec![
            QuestionDef::new("Q1", "Roles are clear", "Roles", "Clarity"),
            QuestionDef::new("Q2", "Duties are shared", "Roles", "Fairness"),
            QuestionDef::new("Q3", "Expectations are known", "Roles", "Clarity"),
            QuestionDef::new("Q4", "We talk often", "Communication", "Frequency"),
        ];
        let rows = vec![
            AnswerRow::new("Smith")
                .with_answer("Q1", "4")
                .with_answer("Q2", "3")
                .with_answer("Q3", "5")
                .with_answer("Q4", "1"),
            AnswerRow::new("Jones")
                .with_answer("Q1", "2")
                .with_answer("Q3", "2")
                .with_answer("Q4", "N/A"),
        ];
        enrich(&catalog, &aggregate_answers(&rows))
    }

    #[test]
    fn test_category_bucket_sums() {
        let (by_category, _) = roll_up(&enriched_fixture());

        let roles = &by_category["Roles"];
        assert_eq!(roles.respondents["Smith"], Stat::new(3, 12));
        assert_eq!(roles.respondents["Jones"], Stat::new(2, 4));
        assert_eq!(roles.total, Stat::new(5, 16));
        assert_eq!(roles.total.average(), 3.2);
    }

    #[test]
    fn test_subcategory_bucket_sums_and_parent() {
        let (_, by_subcategory) = roll_up(&enriched_fixture());

        let clarity = &by_subcategory["Clarity"];
        assert_eq!(clarity.category, "Roles");
        assert_eq!(clarity.respondents["Smith"].stat, Stat::new(2, 9));
        assert_eq!(clarity.respondents["Jones"].stat, Stat::new(2, 4));
        assert_eq!(clarity.total, Stat::new(4, 13));
        assert!(clarity.respondents.values().all(|r| r.rank == 0));
    }

    #[test]
    fn test_zero_stat_respondents_are_present_in_buckets() {
        let (by_category, by_subcategory) = roll_up(&enriched_fixture());

        assert_eq!(by_category["Communication"].respondents["Jones"], Stat::zero());
        assert_eq!(by_subcategory["Fairness"].respondents["Jones"].stat, Stat::zero());
        assert_eq!(by_subcategory["Fairness"].total, Stat::new(1, 3));
    }

    #[test]
    fn test_bucket_order_is_first_seen() {
        let (by_category, by_subcategory) = roll_up(&enriched_fixture());

        let cats: Vec<_> = by_category.keys().map(String::as_str).collect();
        assert_eq!(cats, vec!["Roles", "Communication"]);
        let subs: Vec<_> = by_subcategory.keys().map(String::as_str).collect();
        assert_eq!(subs, vec!["Clarity", "Fairness", "Frequency"]);
    }

    #[test]
    fn test_conflicting_subcategory_keeps_first_category() {
        let catalog = vec![
            QuestionDef::new("Q1", "a", "Roles", "Shared"),
            QuestionDef::new("Q2", "b", "Communication", "Shared"),
        ];
        let rows = vec![AnswerRow::new("Smith")
            .with_answer("Q1", "1")
            .with_answer("Q2", "3")];
        let (by_category, by_subcategory) = roll_up(&enrich(&catalog, &aggregate_answers(&rows)));

        assert_eq!(by_subcategory["Shared"].category, "Roles");
        assert_eq!(by_subcategory["Shared"].total, Stat::new(2, 4));
        assert_eq!(by_category.len(), 2);
    }

    #[test]
    fn test_totals_match_respondent_sums() {
        let (by_category, by_subcategory) = roll_up(&enriched_fixture());

        for bucket in by_category.values() {
            let count: u64 = bucket.respondents.values().map(|s| s.count()).sum();
            let sum: u128 = bucket.respondents.values().map(|s| s.sum()).sum();
            assert_eq!(bucket.total.count(), count);
            assert_eq!(bucket.total.sum(), sum);
        }
        for bucket in by_subcategory.values() {
            let count: u64 = bucket.respondents.values().map(|r| r.stat.count()).sum();
            let sum: u128 = bucket.respondents.values().map(|r| r.stat.sum()).sum();
            assert_eq!(bucket.total.count(), count);
            assert_eq!(bucket.total.sum(), sum);
        }
    }

    #[test]
    fn test_no_respondents_yields_empty_buckets() {
        let catalog = vec![QuestionDef::new("Q1", "a", "Roles", "Clarity")];
        let (by_category, by_subcategory) = roll_up(&enrich(&catalog, &Default::default()));

        assert!(by_category["Roles"].respondents.is_empty());
        assert_eq!(by_category["Roles"].total, Stat::zero());
        assert_eq!(by_subcategory["Clarity"].total, Stat::zero());
    }
}
