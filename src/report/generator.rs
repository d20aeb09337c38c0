//! Markdown and JSON report generation.
//!
//! The JSON report is the bare aggregation result; the Markdown report adds
//! run metadata and read-only summaries on top of it.

use crate::analysis::{
    heatmap, respondent_ids, standings, strongest_subcategories, weakest_subcategories,
};
use crate::config::ReportConfig;
use crate::models::{AggregationResult, Report, ReportMetadata, SubcategoryBucket};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();
    let results = &report.results;

    // Title
    output.push_str("# FamNav Survey Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Table of contents
    output.push_str(&generate_table_of_contents(results, options));

    // Category and subcategory roll-ups
    output.push_str(&generate_category_section(results, options));
    output.push_str(&generate_subcategory_section(results, options));

    // Strongest / weakest subcategories
    output.push_str(&generate_highlights_section(results, options));

    if options.include_heatmap {
        output.push_str(&generate_heatmap_section(results, options));
    }

    if options.include_questions {
        output.push_str(&generate_questions_section(results, options));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Catalog:** `{}`\n", metadata.catalog_path));
    section.push_str(&format!("- **Answers:** `{}`\n", metadata.answers_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Questions:** {}\n", metadata.questions));
    section.push_str(&format!(
        "- **Respondents:** {} ({} rows)\n",
        metadata.respondents, metadata.rows
    ));
    section.push_str(&format!(
        "- **Answers Counted:** {}\n",
        metadata.answered_cells
    ));
    if metadata.skipped_cells > 0 {
        section.push_str(&format!(
            "- **Answers Skipped:** {}\n",
            metadata.skipped_cells
        ));
    }
    section.push_str(&format!("- **Tie-break:** {}\n", metadata.tie_break));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(results: &AggregationResult, options: &ReportConfig) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Categories](#categories)\n");
    toc.push_str("- [Subcategories](#subcategories)\n");

    for label in results.by_subcategory.keys() {
        toc.push_str(&format!("  - [{}](#{})\n", label, anchor(label)));
    }

    toc.push_str("- [Highlights](#highlights)\n");
    if options.include_heatmap {
        toc.push_str("- [Heatmap](#heatmap)\n");
    }
    if options.include_questions {
        toc.push_str("- [Questions](#questions)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the category table: one row per category, one column per respondent.
fn generate_category_section(results: &AggregationResult, options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Categories\n\n");

    if results.by_category.is_empty() {
        section.push_str("No categories in the catalog.\n\n");
        return section;
    }

    let respondents = respondent_ids(results);

    section.push_str("| Category |");
    for respondent in &respondents {
        section.push_str(&format!(" {} |", escape(respondent)));
    }
    section.push_str(" **Total** | Answers |\n");
    section.push_str("|:---|");
    section.push_str(&":---:|".repeat(respondents.len() + 2));
    section.push('\n');

    for (label, bucket) in &results.by_category {
        section.push_str(&format!("| {} |", escape(label)));
        for respondent in &respondents {
            let value = bucket
                .respondents
                .get(respondent)
                .map(|stat| fmt_average(stat.average(), options.decimals));
            section.push_str(&format!(" {} |", value.as_deref().unwrap_or("-")));
        }
        section.push_str(&format!(
            " **{}** | {} |\n",
            fmt_average(bucket.total.average(), options.decimals),
            bucket.total.count()
        ));
    }
    section.push('\n');

    section
}

/// Generate one table per subcategory with each respondent's average and rank.
fn generate_subcategory_section(results: &AggregationResult, options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Subcategories\n\n");

    if results.by_subcategory.is_empty() {
        section.push_str("No subcategories in the catalog.\n\n");
        return section;
    }

    section.push_str(
        "*Rank is the subcategory's place among each respondent's own subcategories \
         (1 = that respondent's strongest).*\n\n",
    );

    for (label, bucket) in &results.by_subcategory {
        section.push_str(&generate_subcategory_block(label, bucket, options));
    }

    section
}

/// Generate the table for a single subcategory.
fn generate_subcategory_block(
    label: &str,
    bucket: &SubcategoryBucket,
    options: &ReportConfig,
) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {} {{#{}}}\n\n", label, anchor(label)));
    block.push_str(&format!(
        "*Category: {} | Answers: {} | Average: {}*\n\n",
        bucket.category,
        bucket.total.count(),
        fmt_average(bucket.total.average(), options.decimals)
    ));

    let rows = standings(bucket);
    if rows.is_empty() {
        block.push_str("No respondents.\n\n");
        return block;
    }

    block.push_str("| # | Respondent | Answers | Sum | Average | Rank |\n");
    block.push_str("|:---:|:---|:---:|:---:|:---:|:---:|\n");
    for standing in rows {
        block.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            standing.position,
            escape(standing.respondent),
            standing.stat.count(),
            standing.stat.sum(),
            fmt_average(standing.stat.average(), options.decimals),
            standing.rank
        ));
    }
    block.push('\n');

    block
}

/// Generate the strongest/weakest subcategory lists.
fn generate_highlights_section(results: &AggregationResult, options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Highlights\n\n");

    let strongest = strongest_subcategories(results, options.top_subcategories);
    if strongest.is_empty() {
        section.push_str("No answers were counted.\n\n");
        return section;
    }

    section.push_str("### Strongest Subcategories\n\n");
    for (i, (label, bucket)) in strongest.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** ({}): {}\n",
            i + 1,
            label,
            bucket.category,
            fmt_average(bucket.total.average(), options.decimals)
        ));
    }
    section.push('\n');

    section.push_str("### Weakest Subcategories\n\n");
    let weakest = weakest_subcategories(results, options.top_subcategories);
    for (i, (label, bucket)) in weakest.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** ({}): {}\n",
            i + 1,
            label,
            bucket.category,
            fmt_average(bucket.total.average(), options.decimals)
        ));
    }
    section.push('\n');

    section
}

/// Generate the respondent × subcategory heatmap.
fn generate_heatmap_section(results: &AggregationResult, options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Heatmap\n\n");

    let map = heatmap(results);
    if map.rows.is_empty() || map.columns.is_empty() {
        section.push_str("Nothing to show.\n\n");
        return section;
    }

    section.push_str("| Respondent |");
    for column in &map.columns {
        section.push_str(&format!(" {} |", escape(column)));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&":---:|".repeat(map.columns.len()));
    section.push('\n');

    for (respondent, cells) in map.rows.iter().zip(&map.cells) {
        section.push_str(&format!("| {} |", escape(respondent)));
        for cell in cells {
            match cell {
                Some(average) => {
                    section.push_str(&format!(" {} |", fmt_average(*average, options.decimals)))
                }
                None => section.push_str(" - |"),
            }
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the per-question table.
fn generate_questions_section(results: &AggregationResult, options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Questions\n\n");

    if results.questions.is_empty() {
        section.push_str("The catalog has no questions.\n\n");
        return section;
    }

    section.push_str("| ID | Question | Category | Subcategory | Answers | Average |\n");
    section.push_str("|:---|:---|:---|:---|:---:|:---:|\n");
    for enriched in &results.questions {
        let question = &enriched.question;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape(&question.id),
            escape(&question.text),
            escape(&question.category),
            escape(&question.subcategory),
            enriched.entities.total.count(),
            fmt_average(enriched.entities.total.average(), options.decimals)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by FamNav v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report: the aggregation result only.
pub fn generate_json_report(results: &AggregationResult) -> Result<String> {
    serde_json::to_string_pretty(results).map_err(Into::into)
}

fn fmt_average(average: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, average)
}

fn anchor(label: &str) -> String {
    label.replace(['/', '.', ' '], "-").to_lowercase()
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::run;
    use crate::models::{AnswerRow, QuestionDef, TieBreak};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let catalog = vec![
            QuestionDef::new("Q1", "Roles are clear", "Roles", "Clarity"),
            QuestionDef::new("Q2", "Chores are split", "Roles", "Fairness"),
            QuestionDef::new("Q3", "We talk daily", "Communication", "Frequency"),
        ];
        let rows = vec![
            AnswerRow::new("Smith")
                .with_answer("Q1", "4")
                .with_answer("Q2", "1")
                .with_answer("Q3", "3"),
            AnswerRow::new("Jones")
                .with_answer("Q1", "2")
                .with_answer("Q2", "n/a"),
        ];
        let results = run(&catalog, &rows, TieBreak::Label).unwrap();

        let metadata = ReportMetadata {
            catalog_path: "questions.json".to_string(),
            answers_path: "roster.csv".to_string(),
            generated_at: Utc::now(),
            rows: 2,
            respondents: 2,
            questions: 3,
            answered_cells: 4,
            skipped_cells: 1,
            tie_break: TieBreak::Label,
            duration_seconds: 0.01,
        };

        Report { metadata, results }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# FamNav Survey Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Categories"));
        assert!(markdown.contains("## Subcategories"));
        assert!(markdown.contains("### Clarity {#clarity}"));
        assert!(markdown.contains("## Heatmap"));
        assert!(markdown.contains("## Questions"));
        assert!(markdown.contains("Chores are split"));
    }

    #[test]
    fn test_optional_sections_can_be_disabled() {
        let report = create_test_report();
        let options = ReportConfig {
            include_heatmap: false,
            include_questions: false,
            ..ReportConfig::default()
        };

        let markdown = generate_markdown_report(&report, &options);

        assert!(!markdown.contains("## Heatmap"));
        assert!(!markdown.contains("## Questions"));
        assert!(!markdown.contains("(#heatmap)"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.metadata);

        assert!(section.contains("questions.json"));
        assert!(section.contains("roster.csv"));
        assert!(section.contains("Answers Skipped:** 1"));
        assert!(section.contains("Tie-break:** label"));
    }

    #[test]
    fn test_subcategory_block_lists_rank_and_position() {
        let report = create_test_report();
        let bucket = &report.results.by_subcategory["Clarity"];

        let block = generate_subcategory_block("Clarity", bucket, &ReportConfig::default());

        // Smith: Clarity 4.00 is their best subcategory; Jones only answered Clarity.
        assert!(block.contains("| 1 | Smith | 1 | 4 | 4.00 | 1 |"));
        assert!(block.contains("| 2 | Jones | 1 | 2 | 2.00 | 1 |"));
    }

    #[test]
    fn test_heatmap_without_respondents() {
        let catalog = vec![QuestionDef::new("Q1", "a", "Roles", "Clarity")];
        let results = run(&catalog, &[], TieBreak::Label).unwrap();

        let section = generate_heatmap_section(&results, &ReportConfig::default());
        assert!(section.contains("Nothing to show."));
    }

    #[test]
    fn test_decimals_respected() {
        let report = create_test_report();
        let options = ReportConfig {
            decimals: 0,
            ..ReportConfig::default()
        };

        let section = generate_questions_section(&report.results, &options);
        assert!(section.contains("| Q1 | Roles are clear | Roles | Clarity | 2 | 3 |"));
    }

    #[test]
    fn test_escape_pipes() {
        assert_eq!(escape("a|b"), "a\\|b");
        assert_eq!(anchor("Roles/Clarity 2"), "roles-clarity-2");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report.results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(value["questions"].is_array());
        assert_eq!(value["by_subcategory"]["Clarity"]["cat"], "Roles");
        assert_eq!(value["by_subcategory"]["Clarity"]["Smith"]["rank"], 1);
        assert!(!json.contains("catalog_path"));
    }
}
