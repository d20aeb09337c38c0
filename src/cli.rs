//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::TieBreak;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// FamNav - survey roll-up and report generator
///
/// Aggregates multiple-choice survey answers per question, per category and
/// per subcategory, ranks each family's subcategories, and writes a
/// Markdown or JSON report.
///
/// Examples:
///   famnav --catalog questions.json --answers roster.csv
///   famnav --catalog questions.json --answers roster.csv --format json -o results.json
///   famnav --catalog questions.json --answers roster.csv --dry-run
///   famnav --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Question catalog (JSON array of question records)
    #[arg(long, value_name = "FILE", required_unless_present = "init_config")]
    pub catalog: Option<PathBuf>,

    /// Answer roster (CSV, or JSON when the file ends in .json)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub answers: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file setting, or famnav_report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .famnav.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Roster column that identifies the respondent
    #[arg(long, value_name = "NAME", env = "FAMNAV_RESPONDENT_COLUMN")]
    pub respondent_column: Option<String>,

    /// How equal averages are ordered when ranking subcategories
    #[arg(long, value_name = "POLICY")]
    pub tie_break: Option<TieBreak>,

    /// Dry run: load and validate inputs without aggregating
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .famnav.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Catalog path; empty when not set (validate first).
    pub fn catalog_path(&self) -> &Path {
        self.catalog.as_deref().unwrap_or(Path::new(""))
    }

    /// Answers path; empty when not set (validate first).
    pub fn answers_path(&self) -> &Path {
        self.answers.as_deref().unwrap_or(Path::new(""))
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        for (flag, path) in [("--catalog", &self.catalog), ("--answers", &self.answers)] {
            let Some(path) = path else {
                return Err(format!("{} is required", flag));
            };
            if !path.exists() {
                return Err(format!("{} file does not exist: {}", flag, path.display()));
            }
            if !path.is_file() {
                return Err(format!("{} path is not a file: {}", flag, path.display()));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref column) = self.respondent_column {
            if column.trim().is_empty() {
                return Err("Respondent column name cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
