//! Series Diff - compare a baseline and a modified simulation CSV export
//!
//! Writes one chart per common column (baseline, modified, delta) into the
//! output directory, plus a `summary.json` describing the run.

use anyhow::{Context, Result};
use clap::Parser;
use series_diff::charts::PngRenderer;
use series_diff::{run, ColumnSelection, RowRange, RunConfig};
use std::path::PathBuf;

/// Plot and compare two CSV time-series exports column by column
#[derive(Parser, Debug)]
#[command(name = "series-diff")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Baseline (reference) CSV file
    #[arg(value_name = "BASELINE_CSV")]
    baseline: PathBuf,

    /// Modified (candidate) CSV file
    #[arg(value_name = "MODIFIED_CSV")]
    modified: PathBuf,

    /// Output directory path to save plots
    #[arg(short = 'o', long = "output-dir", default_value = "plots")]
    output_dir: PathBuf,

    /// Only compare these columns (repeat or comma separate)
    #[arg(short = 'c', long = "cols", value_delimiter = ',')]
    cols: Vec<String>,

    /// First row to plot (1-based)
    #[arg(long = "low-row")]
    low_row: Option<usize>,

    /// Upper row bound (1-based, exclusive)
    #[arg(long = "high-row")]
    high_row: Option<usize>,

    /// Skip charts for columns that are identical in both files
    #[arg(long = "only-diffs")]
    only_diffs: bool,

    /// Zip the output directory into this file when done
    #[arg(long = "archive", value_name = "FILE.zip")]
    archive: Option<PathBuf>,

    /// Worker threads for rendering (0 = one per core)
    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    jobs: usize,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> RunConfig {
        RunConfig {
            selection: ColumnSelection::from(self.cols),
            row_range: RowRange::new(self.low_row, self.high_row),
            only_diffs: self.only_diffs,
            archive: self.archive,
            jobs: self.jobs,
            ..RunConfig::new(self.baseline, self.modified, self.output_dir)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let config = args.into_config();
    let renderer = PngRenderer::new(&config.output_dir);

    let report = run(&config, &renderer).with_context(|| {
        format!(
            "comparison of {} and {} failed",
            config.baseline.display(),
            config.modified.display()
        )
    })?;

    println!(
        "{} chart(s) written to {}",
        report.compared.iter().filter(|c| c.chart.is_some()).count(),
        config.output_dir.display()
    );
    Ok(())
}
