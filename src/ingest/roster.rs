//! Answer roster loading.
//!
//! A roster is either a CSV export (one header line, one record per
//! respondent row) or a JSON array of flat objects. Only columns named by a
//! catalog question id become answer cells; everything else is ignored.

use crate::analysis::{parse_scale_value, validate_inputs};
use crate::error::{AggregationError, Result};
use crate::models::{AnswerRow, QuestionDef};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Options controlling how roster columns are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterOptions {
    /// Header of the respondent-identifying column.
    pub respondent_column: String,
    /// Other headers accepted as the respondent column, tried in order.
    pub respondent_aliases: Vec<String>,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            respondent_column: "respondent".to_string(),
            respondent_aliases: vec!["Date of Last Access".to_string(), "family".to_string()],
        }
    }
}

impl From<&crate::config::InputConfig> for RosterOptions {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            respondent_column: config.respondent_column.clone(),
            respondent_aliases: config.respondent_aliases.clone(),
        }
    }
}

impl RosterOptions {
    fn candidates(&self) -> Vec<String> {
        std::iter::once(self.respondent_column.clone())
            .chain(self.respondent_aliases.iter().cloned())
            .collect()
    }

    /// Find the respondent column among `headers`, case-insensitively.
    fn find_respondent<'a, I>(&self, headers: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
        self.candidates().iter().find_map(|candidate| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(candidate.trim()))
        })
    }
}

/// Counts describing a loaded roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterStats {
    /// Number of data rows.
    pub rows: usize,
    /// Number of distinct respondent ids.
    pub respondents: usize,
    /// Cells that parse as a scale value.
    pub answered_cells: usize,
    /// Non-blank cells that do not parse and will be skipped.
    pub skipped_cells: usize,
    /// Columns that are neither the respondent column nor a catalog question.
    pub ignored_columns: Vec<String>,
}

/// Parsed answer rows plus their statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub rows: Vec<AnswerRow>,
    pub stats: RosterStats,
}

impl Roster {
    fn from_rows(rows: Vec<AnswerRow>, ignored_columns: Vec<String>) -> Self {
        let respondents: HashSet<&str> = rows.iter().map(|r| r.respondent_id.as_str()).collect();
        let (answered_cells, skipped_cells) = rows
            .iter()
            .flat_map(|r| r.answers.values())
            .fold((0, 0), |(ok, skipped), cell| match parse_scale_value(cell) {
                Some(_) => (ok + 1, skipped),
                None => (ok, skipped + 1),
            });

        let stats = RosterStats {
            rows: rows.len(),
            respondents: respondents.len(),
            answered_cells,
            skipped_cells,
            ignored_columns,
        };

        Self { rows, stats }
    }
}

/// Load a roster file, choosing JSON or CSV by extension.
pub fn load_roster(
    path: &Path,
    catalog: &[QuestionDef],
    options: &RosterOptions,
) -> Result<Roster> {
    let content = fs::read_to_string(path).map_err(|source| AggregationError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let roster = if is_json {
        parse_roster_json(&content, catalog, options)?
    } else {
        parse_roster_csv(&content, catalog, options)?
    };

    info!(
        "Loaded {} rows ({} respondents) from {}",
        roster.stats.rows,
        roster.stats.respondents,
        path.display()
    );

    Ok(roster)
}

/// Parse a CSV roster.
pub fn parse_roster_csv(
    text: &str,
    catalog: &[QuestionDef],
    options: &RosterOptions,
) -> Result<Roster> {
    let mut records = split_records(text).into_iter();

    let Some((_, header)) = records.next() else {
        debug!("Roster is empty");
        return Ok(Roster::default());
    };
    let header: Vec<String> = header
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let respondent = options
        .find_respondent(header.iter().map(String::as_str))
        .ok_or_else(|| AggregationError::MissingRespondentColumn {
            candidates: options.candidates(),
        })?;

    let question_ids: HashSet<&str> = catalog.iter().map(|q| q.id.as_str()).collect();
    let mut questions: Vec<(usize, &str)> = Vec::new();
    let mut ignored = Vec::new();
    for (column, name) in header.iter().enumerate() {
        if column == respondent {
            continue;
        }
        match question_ids.get(name.as_str()) {
            Some(&id) => questions.push((column, id)),
            None => ignored.push(name.clone()),
        }
    }
    if !ignored.is_empty() {
        debug!("Ignoring non-question columns: {}", ignored.join(", "));
    }

    let mut rows = Vec::new();
    for (line, fields) in records {
        if fields.len() > header.len() {
            return Err(AggregationError::MalformedRecord {
                line,
                detail: format!(
                    "expected at most {} fields, found {}",
                    header.len(),
                    fields.len()
                ),
            });
        }

        let respondent_id = fields
            .get(respondent)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let mut row = AnswerRow::new(respondent_id);
        for &(column, question_id) in &questions {
            if let Some(cell) = fields.get(column).filter(|c| !c.trim().is_empty()) {
                row.answers.insert(question_id.to_string(), cell.clone());
            }
        }
        rows.push(row);
    }

    validate_inputs(catalog, &rows)?;
    Ok(Roster::from_rows(rows, ignored))
}

/// Parse a JSON roster: an array of flat objects keyed by column name.
pub fn parse_roster_json(
    text: &str,
    catalog: &[QuestionDef],
    options: &RosterOptions,
) -> Result<Roster> {
    let records: Vec<IndexMap<String, Value>> = serde_json::from_str(text)?;
    let question_ids: HashSet<&str> = catalog.iter().map(|q| q.id.as_str()).collect();

    let mut rows = Vec::with_capacity(records.len());
    let mut ignored: IndexSet<String> = IndexSet::new();

    for record in &records {
        let respondent = options
            .find_respondent(record.keys().map(String::as_str))
            .ok_or_else(|| AggregationError::MissingRespondentColumn {
                candidates: options.candidates(),
            })?;

        let mut row = AnswerRow::default();
        for (column, (key, value)) in record.iter().enumerate() {
            let key = key.trim();
            if column == respondent {
                row.respondent_id = cell_text(value).unwrap_or_default().trim().to_string();
            } else if question_ids.contains(key) {
                if let Some(cell) = cell_text(value).filter(|c| !c.trim().is_empty()) {
                    row.answers.insert(key.to_string(), cell);
                }
            } else {
                ignored.insert(key.to_string());
            }
        }
        rows.push(row);
    }

    if !ignored.is_empty() {
        debug!(
            "Ignoring non-question keys: {}",
            ignored.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    validate_inputs(catalog, &rows)?;
    Ok(Roster::from_rows(rows, ignored.into_iter().collect()))
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Split CSV text into records, tagging each with its starting line number.
///
/// Fields may be quoted; `""` inside quotes is a literal quote, and quoted
/// fields may span lines. A quote inside an unquoted field is literal.
/// Blank lines are skipped.
fn split_records(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            // Only a quote at the start of a field opens quoting.
            '"' if buf.is_empty() => in_quotes = true,
            '"' => buf.push('"'),
            ',' if !in_quotes => fields.push(std::mem::take(&mut buf)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut buf));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            '\n' => {
                buf.push('\n');
                line += 1;
            }
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() || !fields.is_empty() {
        fields.push(buf);
        push_record(&mut records, record_line, fields);
    }

    records
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    let blank = fields.iter().all(|f| f.trim().is_empty());
    if !blank {
        records.push((line, fields));
    }
}
