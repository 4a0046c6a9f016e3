//! Convert command - redact every PDF in a directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use idmask_core::batch::Batch;
use idmask_core::models::outcome::{BatchReport, FileOutcome, FileStatus};

use super::load_config;

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Directory containing the PDF documents
    input_dir: PathBuf,

    /// CSV file with `id` and `name` columns
    #[arg(short, long)]
    records: PathBuf,

    /// Output directory (default: timestamped directory inside the input directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TrueType font for the replacement text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Also write summary.csv into the output directory
    #[arg(long)]
    summary: bool,

    /// Print the batch report as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(font) = args.font.clone() {
        config.font.path = Some(font);
    }

    let batch = Batch::prepare(&args.input_dir, &args.records, args.output_dir.as_deref(), &config)?;

    if !args.json {
        println!(
            "{} Found {} documents, {} records ({})",
            style("ℹ").blue(),
            batch.documents().len(),
            batch.records().len(),
            batch.records().encoding()
        );
    }

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(batch.documents().len() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = batch.run(|path, outcome| {
        progress.set_message(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        if outcome.status == FileStatus::Error {
            progress.println(format!(
                "{} {}: {}",
                style("✗").red(),
                outcome.file,
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
        progress.inc(1);
    });
    progress.finish_and_clear();

    if args.summary {
        let summary_path = report.out_dir.join("summary.csv");
        write_summary(&summary_path, &report.results)?;
        debug!("Wrote summary to {}", summary_path.display());
        if !args.json {
            println!("{} Summary written to {}", style("✓").green(), summary_path.display());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, start);
    }

    Ok(())
}

fn print_summary(report: &BatchReport, start: Instant) {
    println!();
    println!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        report.count,
        start.elapsed()
    );
    println!(
        "   {} redacted, {} skipped, {} failed",
        style(report.count_status(FileStatus::Ok)).green(),
        style(report.count_status(FileStatus::Skipped)).yellow(),
        style(report.count_status(FileStatus::Error)).red()
    );
    println!("   Output: {}", report.out_dir.display());

    let skipped: Vec<&FileOutcome> = report
        .results
        .iter()
        .filter(|r| r.status == FileStatus::Skipped)
        .collect();
    if !skipped.is_empty() {
        println!();
        println!("{}", style("Skipped files:").yellow());
        for outcome in skipped {
            println!("  - {}: {}", outcome.file, outcome.reason.as_deref().unwrap_or(""));
        }
    }
}

fn write_summary(path: &Path, results: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "status", "mode", "out_path", "reason", "error"])?;

    for outcome in results {
        let status = outcome.status.to_string();
        let mode = outcome.mode.map(|m| m.to_string()).unwrap_or_default();
        let out_path = outcome
            .out_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        wtr.write_record([
            outcome.file.as_str(),
            status.as_str(),
            mode.as_str(),
            out_path.as_str(),
            outcome.reason.as_deref().unwrap_or(""),
            outcome.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
