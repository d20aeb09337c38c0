//! Configuration file handling.
//!
//! This module handles loading `.famnav.toml` files and merging them with
//! command-line arguments.

use crate::cli::OutputFormat;
use crate::models::TieBreak;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".famnav.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Roster input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Ranking settings.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "famnav_report.md".to_string()
}

/// Roster input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Header of the respondent-identifying column.
    #[serde(default = "default_respondent_column")]
    pub respondent_column: String,

    /// Other headers accepted as the respondent column.
    #[serde(default = "default_respondent_aliases")]
    pub respondent_aliases: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            respondent_column: default_respondent_column(),
            respondent_aliases: default_respondent_aliases(),
        }
    }
}

fn default_respondent_column() -> String {
    "respondent".to_string()
}

fn default_respondent_aliases() -> Vec<String> {
    // Legacy survey exports identify families by their last-access stamp.
    vec!["Date of Last Access", "family"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Ranking settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    /// How equal averages are ordered.
    #[serde(default)]
    pub tie_break: TieBreak,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for averages.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Include the per-question table.
    #[serde(default = "default_true")]
    pub include_questions: bool,

    /// Include the respondent × subcategory heatmap.
    #[serde(default = "default_true")]
    pub include_heatmap: bool,

    /// How many subcategories to list as strongest/weakest.
    #[serde(default = "default_top_subcategories")]
    pub top_subcategories: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            include_questions: true,
            include_heatmap: true,
            top_subcategories: default_top_subcategories(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_decimals() -> usize {
    2
}

fn default_top_subcategories() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref column) = args.respondent_column {
            self.input.respondent_column = column.clone();
        }
        if let Some(tie_break) = args.tie_break {
            self.ranking.tie_break = tie_break;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
