//! CLI entry point for the data-mining pipeline.

use anyhow::{Result, anyhow};
use campus_processing::{Pipeline, PipelineConfig, RunReport, queries};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Batch data-mining pipeline for US higher-education datasets",
    long_about = "Cleans the five raw datasets (tuition_cost, salary_potential,\n\
                  diversity_school, historical_tuition, tuition_income) into a\n\
                  file-backed store, then runs the built-in query battery and\n\
                  writes one CSV artifact per result.\n\n\
                  EXAMPLES:\n  \
                  # Full run with defaults\n  \
                  campus-processing --data-dir data\n\n  \
                  # Re-clean everything and only run two queries\n  \
                  campus-processing --force-clean -q hidden_gems -q avg_cost_by_state\n\n  \
                  # Machine-readable report on stdout\n  \
                  campus-processing --json"
)]
struct Args {
    /// Directory containing the raw CSV datasets
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Directory for cleaned-table artifacts
    #[arg(short, long, default_value = "cleaned")]
    store_dir: String,

    /// Output directory for query results
    #[arg(short, long, default_value = "results")]
    output: String,

    /// Run only the named query (repeatable)
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// List the built-in query names and exit
    #[arg(long)]
    list_queries: bool,

    /// Re-clean raw tables even when cleaned artifacts exist
    #[arg(long)]
    force_clean: bool,

    /// Decimal precision for floats in result CSVs
    #[arg(long, default_value = "2")]
    float_precision: usize,

    /// Write a detailed JSON run report to the output directory
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output the run report as JSON to stdout instead of a summary
    ///
    /// Disables all progress logs; only the JSON report reaches stdout.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors)
    #[arg(long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging stays disabled so stdout only
/// carries the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if args.list_queries {
        for plan in queries::battery() {
            println!("{}", plan.name);
        }
        return Ok(());
    }

    let config = PipelineConfig::builder()
        .data_dir(&args.data_dir)
        .store_dir(&args.store_dir)
        .output_dir(&args.output)
        .float_precision(args.float_precision)
        .force_clean(args.force_clean)
        .query_filter(args.queries.clone())
        .build()?;

    info!("Starting pipeline run (data: {})", args.data_dir);
    let report = Pipeline::new(config).run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if args.emit_report {
            let path = report.write_to_file(std::path::Path::new(&args.output))?;
            info!("Run report written to: {}", path.display());
        }
        print_summary(&report);
    }

    if report.failed_queries() == report.queries.len() && !report.queries.is_empty() {
        return Err(anyhow!("All queries failed"));
    }
    Ok(())
}

/// Print a human-readable run summary.
///
/// Uses `println!` intentionally: this is the primary CLI output and
/// should be visible regardless of log level.
fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "=".repeat(72));
    println!("PIPELINE RUN COMPLETE");
    println!("{}", "=".repeat(72));

    if report.cleaning.is_empty() {
        println!("\nCleaning: all cleaned artifacts already present, nothing to do");
    } else {
        println!("\nCleaning:");
        for c in &report.cleaning {
            if c.passthrough {
                println!("  {:<20} passthrough ({} rows)", c.table, c.rows_after);
            } else {
                println!(
                    "  {:<20} {} -> {} rows ({} duplicates removed)",
                    c.table, c.rows_before, c.rows_after, c.duplicates_removed
                );
                for ns in &c.null_stats {
                    println!(
                        "    {:<26} {} nulls ({:.1}%)",
                        ns.column, ns.null_count, ns.null_percentage
                    );
                }
            }
        }
    }

    println!("\nQueries:");
    for q in &report.queries {
        match (&q.rows, &q.error) {
            (Some(rows), _) => println!("  {:<30} {} rows", q.name, rows),
            (_, Some(err)) => println!("  {:<30} FAILED: {}", q.name, err),
            _ => {}
        }
    }

    println!(
        "\n{} queries run, {} failed",
        report.queries.len(),
        report.failed_queries()
    );
    println!("{}", "=".repeat(72));
}
