//! Data models for the survey roll-up engine.
//!
//! This module contains the question catalog and answer roster types, the
//! statistic types produced by the aggregation stages, and the report
//! envelope handed to the renderers.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Reserved entity key holding the across-respondent total.
pub const TOTAL_KEY: &str = "total";

/// Reserved subcategory key holding the parent category label.
pub const CATEGORY_KEY: &str = "cat";

/// Whether an id collides with a reserved output key.
pub fn is_reserved_key(id: &str) -> bool {
    id == TOTAL_KEY || id == CATEGORY_KEY
}

/// Tie-break policy for equal averages when ranking a respondent's subcategories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Equal averages are ordered by subcategory label (lexical ascending).
    #[default]
    Label,
    /// Equal averages keep the order in which subcategories first appear in the catalog.
    Catalog,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::Label => write!(f, "label"),
            TieBreak::Catalog => write!(f, "catalog"),
        }
    }
}

/// A single question from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionDef {
    /// Stable per-question token (e.g. `Q7`), unique within a catalog.
    pub id: String,
    /// Question wording.
    pub text: String,
    /// Category (pathway) label.
    pub category: String,
    /// Subcategory (competence) label.
    pub subcategory: String,
}

impl QuestionDef {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

/// One raw response record from the roster.
///
/// Cells are kept as the raw text found in the input; absent cells have no
/// entry. Whether a cell counts is decided by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerRow {
    /// Respondent ("family") identifier.
    pub respondent_id: String,
    /// Raw cell text keyed by question id.
    pub answers: IndexMap<String, String>,
}

impl AnswerRow {
    /// Creates a row with no answers.
    pub fn new(respondent_id: impl Into<String>) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            answers: IndexMap::new(),
        }
    }

    /// Adds a raw answer cell, returning the row.
    pub fn with_answer(mut self, question_id: impl Into<String>, cell: impl Into<String>) -> Self {
        self.answers.insert(question_id.into(), cell.into());
        self
    }
}

/// The `{count, sum, average}` triple.
///
/// A `Stat` is always derived from a count and a sum; the average is never
/// set on its own. Values are `u64`, so a `u128` sum cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Stat {
    count: u64,
    sum: u128,
    average: f64,
}

impl Stat {
    /// Builds a stat from its totals, deriving the average.
    pub fn new(count: u64, sum: u128) -> Self {
        let average = if count > 0 {
            sum as f64 / count as f64
        } else {
            0.0
        };
        Self {
            count,
            sum,
            average,
        }
    }

    /// The stat substituted for a respondent with no scored entry.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> u128 {
        self.sum
    }

    pub fn average(&self) -> f64 {
        self.average
    }
}

/// Running count/sum accumulator that finishes into a [`Stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    count: u64,
    sum: u128,
}

impl Tally {
    /// Records one scored answer.
    pub fn record(&mut self, value: u64) {
        self.count += 1;
        self.sum += u128::from(value);
    }

    /// Adds the count and sum of an existing stat.
    pub fn absorb(&mut self, stat: &Stat) {
        self.count += stat.count;
        self.sum += stat.sum;
    }

    /// Derives the final stat. The average is computed here, once.
    pub fn finish(self) -> Stat {
        Stat::new(self.count, self.sum)
    }
}

/// A [`Stat`] with the respondent's rank inside one subcategory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RankedStat {
    #[serde(flatten)]
    pub stat: Stat,
    /// 1-based rank; 0 means unranked.
    pub rank: u32,
}

impl RankedStat {
    pub fn unranked(stat: Stat) -> Self {
        Self { stat, rank: 0 }
    }
}

/// Per-respondent stats for one question plus the across-respondent total.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionEntities {
    pub respondents: IndexMap<String, Stat>,
    pub total: Stat,
}

impl Serialize for QuestionEntities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.respondents.len() + 1))?;
        for (respondent, stat) in &self.respondents {
            map.serialize_entry(respondent, stat)?;
        }
        // The question-level total always carries a placeholder rank of 0.
        map.serialize_entry(TOTAL_KEY, &RankedStat::unranked(self.total))?;
        map.end()
    }
}

/// A catalog question annotated with its aggregated entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedQuestion {
    #[serde(flatten)]
    pub question: QuestionDef,
    pub entities: QuestionEntities,
}

/// Respondent stats rolled up over every question of one category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryBucket {
    pub respondents: IndexMap<String, Stat>,
    pub total: Stat,
}

impl Serialize for CategoryBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.respondents.len() + 1))?;
        for (respondent, stat) in &self.respondents {
            map.serialize_entry(respondent, stat)?;
        }
        map.serialize_entry(TOTAL_KEY, &self.total)?;
        map.end()
    }
}

/// Respondent stats rolled up over every question of one subcategory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubcategoryBucket {
    /// Category of the first question seen with this subcategory.
    pub category: String,
    pub respondents: IndexMap<String, RankedStat>,
    pub total: Stat,
}

impl Serialize for SubcategoryBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.respondents.len() + 2))?;
        map.serialize_entry(CATEGORY_KEY, &self.category)?;
        for (respondent, ranked) in &self.respondents {
            map.serialize_entry(respondent, ranked)?;
        }
        map.serialize_entry(TOTAL_KEY, &self.total)?;
        map.end()
    }
}

/// The complete output of one aggregation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregationResult {
    /// Enriched questions in catalog order.
    pub questions: Vec<EnrichedQuestion>,
    /// Category buckets in first-seen order.
    pub by_category: IndexMap<String, CategoryBucket>,
    /// Subcategory buckets in first-seen order, ranks filled in.
    pub by_subcategory: IndexMap<String, SubcategoryBucket>,
}

/// Metadata about a report run.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Path of the question catalog.
    pub catalog_path: String,
    /// Path of the answer roster.
    pub answers_path: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of roster rows read.
    pub rows: usize,
    /// Number of distinct respondents.
    pub respondents: usize,
    /// Number of catalog questions.
    pub questions: usize,
    /// Number of answer cells that were counted.
    pub answered_cells: u64,
    /// Number of answer cells skipped as non-numeric.
    pub skipped_cells: usize,
    /// Tie-break policy used for ranking.
    pub tie_break: TieBreak,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// Report envelope: run metadata plus the aggregation result.
#[derive(Debug, Clone)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub results: AggregationResult,
}
