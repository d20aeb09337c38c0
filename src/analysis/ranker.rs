//! Respondent ranking.
//!
//! For each respondent, orders the subcategories they appear in by their
//! average (highest first) and writes ranks 1..k back onto the bucket
//! entries. Totals are never ranked.

use super::rollup::SubcategoryBuckets;
use crate::models::TieBreak;
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Rank every respondent's subcategories.
///
/// Equal averages still receive distinct sequential ranks; their order is
/// decided by `tie_break`. This is a full re-scan of all buckets.
pub fn rank(mut buckets: SubcategoryBuckets, tie_break: TieBreak) -> SubcategoryBuckets {
    let labels: Vec<String> = buckets.keys().cloned().collect();

    // respondent -> (bucket index, average)
    let mut scores: IndexMap<String, Vec<(usize, f64)>> = IndexMap::new();
    for (index, bucket) in buckets.values().enumerate() {
        for (respondent, entry) in &bucket.respondents {
            scores
                .entry(respondent.clone())
                .or_default()
                .push((index, entry.stat.average()));
        }
    }

    let respondents = scores.len();
    for (respondent, mut entries) in scores {
        entries.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| tie_order(&labels, tie_break, a.0, b.0))
        });

        for (position, (index, _)) in entries.into_iter().enumerate() {
            if let Some((_, bucket)) = buckets.get_index_mut(index) {
                if let Some(entry) = bucket.respondents.get_mut(&respondent) {
                    entry.rank = position as u32 + 1;
                }
            }
        }
    }

    debug!(
        "Ranked {} respondents across {} subcategories ({} tie-break)",
        respondents,
        buckets.len(),
        tie_break
    );

    buckets
}

fn tie_order(labels: &[String], tie_break: TieBreak, a: usize, b: usize) -> Ordering {
    match tie_break {
        TieBreak::Label => labels[a].cmp(&labels[b]),
        TieBreak::Catalog => a.cmp(&b),
    }
}
