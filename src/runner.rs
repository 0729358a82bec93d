//! End-to-end run: load both exports, compare, render charts, summarise.

use crate::archive::{zip_directory, ArchiveError};
use crate::charts::{marker_interval, ChartSink};
use crate::compare::{compare, ColumnSelection, CompareError, ComparisonResult, RowRange};
use crate::data::{Dataset, LoaderError};
use crate::report::{ComparedColumn, FailedColumn, RunReport, SUMMARY_FILE};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Compare(#[from] CompareError),
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write run summary {path}: {source}")]
    Summary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything one run needs. Paths are used as given; nothing is derived
/// from where the program is installed.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub baseline: PathBuf,
    pub modified: PathBuf,
    pub output_dir: PathBuf,
    pub selection: ColumnSelection,
    pub row_range: RowRange,
    /// Skip charts for columns without any difference.
    pub only_diffs: bool,
    /// Zip the output directory here when set.
    pub archive: Option<PathBuf>,
    /// Worker threads for rendering, 0 for one per core.
    pub jobs: usize,
}

impl RunConfig {
    pub fn new(
        baseline: impl Into<PathBuf>,
        modified: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            baseline: baseline.into(),
            modified: modified.into(),
            output_dir: output_dir.into(),
            selection: ColumnSelection::All,
            row_range: RowRange::default(),
            only_diffs: false,
            archive: None,
            jobs: 0,
        }
    }
}

/// Run a full comparison.
///
/// Load, shape and column errors abort the run. Columns that cannot be
/// extracted or rendered are listed in the returned report's `failed`.
pub fn run(config: &RunConfig, sink: &dyn ChartSink) -> Result<RunReport, RunError> {
    log::info!("Baseline: {}", config.baseline.display());
    log::info!("Modified: {}", config.modified.display());

    let base = Dataset::load(&config.baseline)?;
    let modified = Dataset::load(&config.modified)?;
    let comparison = compare(&base, &modified, &config.selection, config.row_range)?;

    fs::create_dir_all(&config.output_dir).map_err(|source| RunError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    // Marker spacing follows the full file length, not the selected window
    let every = marker_interval(base.row_count());
    let (results, column_errors) = comparison.into_parts();

    let mut failed: Vec<FailedColumn> = column_errors
        .iter()
        .map(|err| {
            log::warn!("Failed on: {}", err.column());
            FailedColumn {
                column: err.column().to_string(),
                reason: err.to_string(),
            }
        })
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()?;
    let rendered: Vec<Result<ComparedColumn, FailedColumn>> = pool.install(|| {
        results
            .par_iter()
            .map(|result| render_column(result, sink, every, config.only_diffs))
            .collect()
    });

    let mut compared = Vec::with_capacity(rendered.len());
    for outcome in rendered {
        match outcome {
            Ok(column) => compared.push(column),
            Err(failure) => failed.push(failure),
        }
    }

    let report = RunReport {
        baseline: base.source().to_string(),
        modified: modified.source().to_string(),
        row_count: base.row_count(),
        row_range: config.row_range,
        compared,
        failed,
    };

    let summary_path = config.output_dir.join(SUMMARY_FILE);
    report
        .write_json(&summary_path)
        .map_err(|source| RunError::Summary {
            path: summary_path.clone(),
            source,
        })?;

    if let Some(archive) = &config.archive {
        zip_directory(&config.output_dir, archive)?;
    }

    report.log_summary();
    Ok(report)
}

fn render_column(
    result: &ComparisonResult,
    sink: &dyn ChartSink,
    every: usize,
    only_diffs: bool,
) -> Result<ComparedColumn, FailedColumn> {
    let identical = result.is_identical();
    let max_abs_difference = result.max_abs_difference();

    if only_diffs && identical {
        log::info!("Skipping: {} (no differences)", result.column);
        return Ok(ComparedColumn {
            column: result.column.clone(),
            chart: None,
            max_abs_difference,
            identical,
        });
    }

    log::info!("Plotting: {}", result.column);
    match sink.emit(result, every) {
        Ok(path) => Ok(ComparedColumn {
            column: result.column.clone(),
            chart: Some(path.display().to_string()),
            max_abs_difference,
            identical,
        }),
        Err(err) => {
            log::warn!("Failed on: {}", result.column);
            Err(FailedColumn {
                column: result.column.clone(),
                reason: err.to_string(),
            })
        }
    }
}
