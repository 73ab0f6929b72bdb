//! orbitchart - satellite orbit usage per launch year
//!
//! A CLI tool that downloads the UCS Satellite Database, counts satellites
//! by launch year and orbit class, and renders a bar chart to HTML.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (download, malformed data under --on-malformed-date abort,
//!       file I/O, invalid arguments)

mod analysis;
mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use extract::{ExtractConfig, RecordExtractor};
use models::{ChartMetadata, ChartReport, ExtractStats, Series};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("orbitchart v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .orbitchart.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to customize the source URL, orbit classes, and chart.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Run the fetch → extract → aggregate → render pipeline.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Get the database text
    let (source, text) = match args.input {
        Some(ref input) => {
            println!("📂 Reading database: {}", input.display());
            let text = fetch::read_local_database(input)?;
            (input.display().to_string(), text)
        }
        None => {
            println!("📥 Downloading database: {}", config.source.url);
            let mut fetch_options = fetch::FetchOptions::from(&config.source);
            fetch_options.show_progress = !args.quiet;

            let client =
                fetch::build_client(&fetch_options).context("Failed to create HTTP client")?;
            let text = fetch::fetch_database(&client, &config.source.url, &fetch_options)
                .await
                .context("Failed to download the satellite database")?;
            (config.source.url.clone(), text)
        }
    };

    process_database(&config, source, &text, args.dry_run)?;

    if !args.dry_run {
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

/// Extract, aggregate, render and write the chart for one database text.
///
/// Nothing is written unless every row was processed.
fn process_database(config: &Config, source: String, text: &str, dry_run: bool) -> Result<()> {
    // Step 2: Extract observations and aggregate them
    println!("🔬 Aggregating launches by year and orbit class...");
    debug!(
        "Malformed launch dates: {}",
        config.source.on_malformed_date
    );
    let mut extractor = RecordExtractor::new(text, ExtractConfig::from(&config.source));
    let table = analysis::try_aggregate(extractor.by_ref())
        .context("Failed to extract observations")?;
    let stats = extractor.stats();

    info!(
        "Extracted {} observations from {} rows ({} short, {} empty dates, {} malformed dates)",
        stats.observations, stats.rows, stats.short_rows, stats.empty_dates, stats.malformed_dates
    );
    extract::warn_if_empty(&stats);

    // Step 3: Project onto the charted classes
    let years = table.sorted_years();
    info!("Counted {} launches across {} years", table.total(), years.len());
    let series = analysis::materialize_series(&table, &years, &config.chart.classes);
    let unlisted = analysis::unlisted_classes(&table, &config.chart.classes);

    if !unlisted.is_empty() {
        warn!(
            "Orbit classes not charted: {}",
            unlisted
                .iter()
                .map(|c| format!("{:?}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    // Handle --dry-run: print summary and exit
    if dry_run {
        print_summary(&years, &series, &stats, &unlisted);
        println!("\n✅ Dry run complete. No file was written.");
        return Ok(());
    }

    // Step 4: Render and save
    println!("📝 Rendering chart...");

    let report = ChartReport {
        title: config.chart.title.clone(),
        metadata: ChartMetadata {
            source,
            generated_at: Utc::now(),
            stats,
            unlisted_classes: unlisted.clone(),
        },
        years,
        series,
        table: table.into_map(),
    };

    let output = match config.general.format {
        OutputFormat::Html => {
            report::generate_html_chart(&report, &report::ChartOptions::from(&config.chart))
        }
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    let output_path = Path::new(&config.general.output);
    report::write_report(output_path, &output)
        .with_context(|| format!("Failed to write chart to {}", output_path.display()))?;

    print_summary(&report.years, &report.series, &stats, &unlisted);
    println!("\n✅ Done! Wrote chart into file: {}", output_path.display());

    Ok(())
}

/// Print the aggregation summary to stdout.
fn print_summary(years: &[String], series: &[Series], stats: &ExtractStats, unlisted: &[String]) {
    println!("\n📊 Summary:");
    println!(
        "   Rows: {} | Included: {} | Skipped: {}",
        stats.rows,
        stats.observations,
        stats.skipped()
    );

    match (years.first(), years.last()) {
        (Some(first), Some(last)) => {
            println!("   Years: {} ({} - {})", years.len(), first, last)
        }
        _ => println!("   Years: none"),
    }

    for s in series {
        println!("   - {}: {}", s.name, s.total());
    }

    if !unlisted.is_empty() {
        println!("   Not charted: {}", unlisted.join(", "));
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
