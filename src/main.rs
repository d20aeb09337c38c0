//! FamNav - survey roll-up and report generator
//!
//! A CLI tool that aggregates multiple-choice survey answers per question,
//! per category and per subcategory, ranks each respondent's subcategories,
//! and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (bad arguments, unreadable or malformed input, write error)

mod analysis;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::AggregationError;
use ingest::{Roster, RosterOptions};
use models::{QuestionDef, Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load configuration before logging so [general] verbose applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("FamNav v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run_report(&args, &config) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ {}: {:#}", failure_label(&e), e);
        std::process::exit(1);
    }
}

/// Heading for a fatal error: input problems are told apart from I/O ones.
fn failure_label(e: &anyhow::Error) -> &'static str {
    let input_shape = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<AggregationError>())
        .is_some_and(AggregationError::is_input_shape);

    if input_shape {
        "Invalid input"
    } else {
        "Error"
    }
}

/// Handle --init-config: generate a default .famnav.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the respondent column, tie-break and report sections.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete load → aggregate → report workflow.
fn run_report(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let catalog_path = args.catalog_path();
    let answers_path = args.answers_path();

    // Step 1: Load inputs
    println!("📥 Loading catalog: {}", catalog_path.display());
    let catalog = ingest::load_catalog(catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    println!("📥 Loading answers: {}", answers_path.display());
    let options = RosterOptions::from(&config.input);
    let roster = ingest::load_roster(answers_path, &catalog, &options)
        .with_context(|| format!("Failed to load answers {}", answers_path.display()))?;

    if !roster.stats.ignored_columns.is_empty() {
        debug!("Ignored columns: {:?}", roster.stats.ignored_columns);
    }

    // Handle --dry-run: validate and exit
    if args.dry_run {
        return handle_dry_run(&catalog, &roster);
    }

    // Step 2: Aggregate
    println!("\n🔬 Aggregating answers...");
    let results = analysis::run(&catalog, &roster.rows, config.ranking.tie_break)
        .context("Aggregation failed")?;

    // Step 3: Build the report
    println!("📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();

    let metadata = ReportMetadata {
        catalog_path: catalog_path.display().to_string(),
        answers_path: answers_path.display().to_string(),
        generated_at: Utc::now(),
        rows: roster.stats.rows,
        respondents: roster.stats.respondents,
        questions: catalog.len(),
        answered_cells: analysis::answered_cells(&results),
        skipped_cells: roster.stats.skipped_cells,
        tie_break: config.ranking.tie_break,
        duration_seconds: duration,
    };

    let report = Report { metadata, results };

    // Step 4: Generate and save the report
    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report.results)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Survey Summary:");
    println!("   Questions: {}", report.metadata.questions);
    println!(
        "   Respondents: {} ({} rows)",
        report.metadata.respondents, report.metadata.rows
    );
    println!(
        "   Answers counted: {} | skipped: {}",
        report.metadata.answered_cells, report.metadata.skipped_cells
    );
    println!(
        "   Categories: {} | Subcategories: {}",
        report.results.by_category.len(),
        report.results.by_subcategory.len()
    );
    println!("   Duration: {:.2}s", duration);
    println!(
        "\n✅ Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Handle --dry-run: print what was loaded, exit without aggregating.
fn handle_dry_run(catalog: &[QuestionDef], roster: &Roster) -> Result<()> {
    println!("\n🔍 Dry run: inputs loaded and validated (no aggregation)...\n");

    analysis::validate_inputs(catalog, &roster.rows).context("Input validation failed")?;

    let stats = &roster.stats;
    println!("   Questions: {}", catalog.len());
    println!("   Rows: {}", stats.rows);
    println!("   Respondents: {}", stats.respondents);
    println!("   Answer cells: {}", stats.answered_cells);
    if stats.skipped_cells > 0 {
        println!("   Non-numeric cells (will be skipped): {}", stats.skipped_cells);
    }
    if !stats.ignored_columns.is_empty() {
        println!("   Ignored columns: {}", stats.ignored_columns.join(", "));
    }

    println!("\n✅ Dry run complete. No report was written.");
    Ok(())
}

/// Where the configuration came from; logged once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    Default,
    Builtin,
    Unreadable(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::Default => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::Default)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(e))),
    }
}
