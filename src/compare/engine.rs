//! Comparison Engine
//! Validates two datasets against each other, resolves the columns to compare
//! and produces aligned baseline / modified / difference series per column.

use crate::compare::{ColumnSelection, RowRange};
use crate::data::{Dataset, INDEX_COLUMN};
use polars::prelude::*;
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

/// Fatal errors: no column is processed when one of these is returned.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error(
        "Files do not have the same number of rows. Each file must contain the same number of rows.\n\
         File: {base_file}, num rows: {base_rows}\n\
         File: {modified_file}, num rows: {modified_rows}"
    )]
    ShapeMismatch {
        base_file: String,
        base_rows: usize,
        modified_file: String,
        modified_rows: usize,
    },
    #[error("File: {file} does not contain all requested columns (missing: {})", .missing.join(", "))]
    ColumnMismatch { file: String, missing: Vec<String> },
    #[error("Invalid row range {range} for {row_count} rows: {reason}")]
    InvalidRowRange {
        range: RowRange,
        row_count: usize,
        reason: &'static str,
    },
}

/// A single column that could not be compared. The rest of the run continues.
#[derive(Error, Debug)]
pub enum ColumnError {
    #[error("column '{column}' in {file} is not numeric ({dtype})")]
    NonNumeric {
        column: String,
        file: String,
        dtype: String,
    },
    #[error("column '{column}' in {file}: {source}")]
    Extract {
        column: String,
        file: String,
        #[source]
        source: PolarsError,
    },
}

impl ColumnError {
    /// Name of the column that failed.
    pub fn column(&self) -> &str {
        match self {
            ColumnError::NonNumeric { column, .. } | ColumnError::Extract { column, .. } => column,
        }
    }
}

/// Aligned values for one column over the resolved row window.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub column: String,
    /// 0-based positional slice both datasets were cut to.
    pub rows: Range<usize>,
    pub baseline: Vec<f64>,
    pub modified: Vec<f64>,
    /// `baseline - modified`, index for index.
    pub difference: Vec<f64>,
}

impl ComparisonResult {
    /// 1-based row numbers matching each value, used as the chart x axis.
    pub fn row_numbers(&self) -> Range<usize> {
        self.rows.start + 1..self.rows.end + 1
    }

    /// Number of compared rows.
    pub fn len(&self) -> usize {
        self.difference.len()
    }

    /// True when the row window selected no rows.
    pub fn is_empty(&self) -> bool {
        self.difference.is_empty()
    }

    /// Largest absolute delta, ignoring NaN gaps.
    pub fn max_abs_difference(&self) -> Option<f64> {
        self.difference
            .iter()
            .filter(|d| !d.is_nan())
            .map(|d| d.abs())
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
    }

    /// True when every row matches exactly (two missing cells count as a match).
    pub fn is_identical(&self) -> bool {
        self.baseline
            .iter()
            .zip(&self.modified)
            .all(|(b, m)| b == m || (b.is_nan() && m.is_nan()))
    }
}

/// Outcome of one comparison run, one entry per resolved column in resolution order.
#[derive(Debug)]
pub struct Comparison {
    pub rows: Range<usize>,
    pub columns: Vec<Result<ComparisonResult, ColumnError>>,
}

impl Comparison {
    /// Columns compared successfully, in resolution order.
    pub fn succeeded(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.columns.iter().filter_map(|c| c.as_ref().ok())
    }

    /// Columns that could not be compared.
    pub fn failed(&self) -> impl Iterator<Item = &ColumnError> {
        self.columns.iter().filter_map(|c| c.as_ref().err())
    }

    /// Split into successes and failures, each keeping resolution order.
    pub fn into_parts(self) -> (Vec<ComparisonResult>, Vec<ColumnError>) {
        let mut ok = Vec::new();
        let mut failed = Vec::new();
        for column in self.columns {
            match column {
                Ok(result) => ok.push(result),
                Err(err) => failed.push(err),
            }
        }
        (ok, failed)
    }
}

/// Compare `base` against `modified`.
///
/// Fails before touching any column when the row counts differ, the row range
/// is out of bounds, or an explicitly requested column is missing from either
/// file. Per-column extraction problems are recorded in the returned
/// [`Comparison`] instead.
pub fn compare(
    base: &Dataset,
    modified: &Dataset,
    selection: &ColumnSelection,
    range: RowRange,
) -> Result<Comparison, CompareError> {
    if base.row_count() != modified.row_count() {
        return Err(CompareError::ShapeMismatch {
            base_file: base.source().to_string(),
            base_rows: base.row_count(),
            modified_file: modified.source().to_string(),
            modified_rows: modified.row_count(),
        });
    }

    let rows = range
        .resolve(base.row_count())
        .map_err(|reason| CompareError::InvalidRowRange {
            range,
            row_count: base.row_count(),
            reason,
        })?;

    let columns = resolve_columns(base, modified, selection)?;
    log::debug!(
        "Comparing {} columns over rows {}..{}",
        columns.len(),
        rows.start + 1,
        rows.end
    );

    let columns = columns
        .into_iter()
        .map(|column| compare_column(base, modified, column, &rows))
        .collect();

    Ok(Comparison { rows, columns })
}

/// Column names of a dataset without the timestamp column.
fn data_columns(ds: &Dataset) -> Vec<String> {
    ds.column_names()
        .into_iter()
        .filter(|name| name != INDEX_COLUMN)
        .collect()
}

fn resolve_columns(
    base: &Dataset,
    modified: &Dataset,
    selection: &ColumnSelection,
) -> Result<Vec<String>, CompareError> {
    let base_cols = data_columns(base);
    let mod_cols = data_columns(modified);

    let requested: Vec<String> = match selection {
        ColumnSelection::All => {
            let in_mod: HashSet<&str> = mod_cols.iter().map(String::as_str).collect();
            let mut common: Vec<String> = base_cols
                .iter()
                .filter(|name| in_mod.contains(name.as_str()))
                .cloned()
                .collect();
            common.sort();
            return Ok(common);
        }
        ColumnSelection::Single(name) => vec![name.trim().to_string()],
        ColumnSelection::List(names) => {
            let mut seen = HashSet::new();
            names
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| seen.insert(name.clone()))
                .collect()
        }
    };

    ensure_present(&requested, &base_cols, base.source())?;
    ensure_present(&requested, &mod_cols, modified.source())?;

    Ok(requested)
}

fn ensure_present(requested: &[String], available: &[String], file: &str) -> Result<(), CompareError> {
    let missing: Vec<String> = requested
        .iter()
        .filter(|name| !available.contains(*name))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CompareError::ColumnMismatch {
            file: file.to_string(),
            missing,
        })
    }
}

fn compare_column(
    base: &Dataset,
    modified: &Dataset,
    column: String,
    rows: &Range<usize>,
) -> Result<ComparisonResult, ColumnError> {
    let baseline = extract_values(base, &column, rows)?;
    let modded = extract_values(modified, &column, rows)?;

    let difference = baseline
        .iter()
        .zip(&modded)
        .map(|(b, m)| b - m)
        .collect();

    Ok(ComparisonResult {
        column,
        rows: rows.clone(),
        baseline,
        modified: modded,
        difference,
    })
}

/// Slice a numeric column to `rows` as f64. Null cells become NaN.
fn extract_values(ds: &Dataset, column: &str, rows: &Range<usize>) -> Result<Vec<f64>, ColumnError> {
    let extract_err = |source: PolarsError| ColumnError::Extract {
        column: column.to_string(),
        file: ds.source().to_string(),
        source,
    };

    let col = ds.frame().column(column).map_err(extract_err)?;
    if !matches!(
        col.dtype(),
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    ) {
        return Err(ColumnError::NonNumeric {
            column: column.to_string(),
            file: ds.source().to_string(),
            dtype: col.dtype().to_string(),
        });
    }

    let sliced = col
        .as_materialized_series()
        .slice(rows.start as i64, rows.len());
    let values = sliced.cast(&DataType::Float64).map_err(extract_err)?;
    let ca = values.f64().map_err(extract_err)?;

    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(name: &str, csv: &str) -> Dataset {
        Dataset::from_reader(name, csv.as_bytes()).unwrap()
    }

    fn scenario() -> (Dataset, Dataset) {
        (
            dataset(
                "base.csv",
                "Date/Time,A,B\n01/01 01:00,1,4\n01/01 02:00,2,5\n01/01 03:00,3,6\n",
            ),
            dataset(
                "mod.csv",
                "Date/Time,A,B\n01/01 01:00,1.5,4.5\n01/01 02:00,2.5,5.5\n01/01 03:00,3.5,6.5\n",
            ),
        )
    }

    #[test]
    fn default_selection_compares_every_common_column() {
        let (base, modified) = scenario();
        let cmp = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap();

        let results: Vec<_> = cmp.succeeded().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].column, "A");
        assert_eq!(results[1].column, "B");
        for r in results {
            assert_eq!(r.difference, vec![-0.5, -0.5, -0.5]);
            assert_eq!(r.baseline.len(), r.modified.len());
        }
        assert_eq!(cmp.failed().count(), 0);
    }

    #[test]
    fn difference_is_base_minus_modified() {
        let (base, modified) = scenario();
        let cmp = compare(&base, &modified, &"A".into(), RowRange::default()).unwrap();
        let a = cmp.succeeded().next().unwrap();
        assert_eq!(a.baseline, vec![1.0, 2.0, 3.0]);
        assert_eq!(a.modified, vec![1.5, 2.5, 3.5]);
        assert_eq!(a.difference, vec![-0.5, -0.5, -0.5]);
        assert_eq!(a.max_abs_difference(), Some(0.5));
        assert!(!a.is_identical());
    }

    #[test]
    fn row_count_mismatch_is_fatal() {
        let base = dataset("base.csv", "Date/Time,A\nx,1\ny,2\nz,3\n");
        let modified = dataset("mod.csv", "Date/Time,A\nx,1.5\ny,2.5\n");

        let err = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap_err();
        match &err {
            CompareError::ShapeMismatch {
                base_rows,
                modified_rows,
                ..
            } => {
                assert_eq!((*base_rows, *modified_rows), (3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("base.csv") && msg.contains("mod.csv"), "{msg}");
    }

    #[test]
    fn shape_gate_runs_before_column_checks() {
        let base = dataset("base.csv", "A\n1\n2\n");
        let modified = dataset("mod.csv", "B\n1\n");
        let err = compare(&base, &modified, &"Z".into(), RowRange::default()).unwrap_err();
        assert!(matches!(err, CompareError::ShapeMismatch { .. }));
    }

    #[test]
    fn intersection_excludes_index_and_uncommon_columns() {
        let base = dataset("base.csv", "Date/Time,A,B\nt,1,2\n");
        let modified = dataset("mod.csv", "Date/Time,A,C\nt,1,2\n");

        let cmp = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap();
        let names: Vec<_> = cmp.succeeded().map(|r| r.column.as_str()).collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn intersection_is_sorted_by_name() {
        let base = dataset("base.csv", "Zeta,alpha,Mid\n1,2,3\n");
        let modified = dataset("mod.csv", "Mid,Zeta,alpha\n3,1,2\n");

        let cmp = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap();
        let names: Vec<_> = cmp.succeeded().map(|r| r.column.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Zeta", "alpha"]);
    }

    #[test]
    fn explicit_column_missing_in_modified_fails() {
        let base = dataset("base.csv", "Date/Time,A,B\nt,1,2\n");
        let modified = dataset("mod.csv", "Date/Time,A\nt,1\n");

        let selection = ColumnSelection::List(vec!["A".into(), "B".into()]);
        let err = compare(&base, &modified, &selection, RowRange::default()).unwrap_err();
        match err {
            CompareError::ColumnMismatch { file, missing } => {
                assert_eq!(file, "mod.csv");
                assert_eq!(missing, vec!["B".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_column_missing_in_base_names_base() {
        let base = dataset("base.csv", "A,C\n1,1\n");
        let modified = dataset("mod.csv", "A,D\n1,1\n");

        let selection = ColumnSelection::List(vec!["A".into(), "E".into()]);
        let err = compare(&base, &modified, &selection, RowRange::default()).unwrap_err();
        assert!(
            matches!(err, CompareError::ColumnMismatch { ref file, .. } if file == "base.csv"),
            "{err}"
        );
    }

    #[test]
    fn index_column_cannot_be_requested() {
        let (base, modified) = scenario();
        let err = compare(&base, &modified, &"Date/Time".into(), RowRange::default()).unwrap_err();
        assert!(matches!(err, CompareError::ColumnMismatch { .. }));
    }

    #[test]
    fn requested_names_are_trimmed_and_deduplicated() {
        let (base, modified) = scenario();
        let selection = ColumnSelection::List(vec![" B ".into(), "A".into(), "B".into()]);
        let cmp = compare(&base, &modified, &selection, RowRange::default()).unwrap();
        let names: Vec<_> = cmp.succeeded().map(|r| r.column.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn row_range_selects_first_row_only() {
        let (base, modified) = scenario();
        let cmp = compare(
            &base,
            &modified,
            &ColumnSelection::All,
            RowRange::new(Some(1), Some(2)),
        )
        .unwrap();

        assert_eq!(cmp.rows, 0..1);
        for r in cmp.succeeded() {
            assert_eq!(r.baseline.len(), 1);
            assert_eq!(r.row_numbers().collect::<Vec<_>>(), vec![1]);
        }
        let a = cmp.succeeded().next().unwrap();
        assert_eq!(a.baseline, vec![1.0]);
        assert_eq!(a.modified, vec![1.5]);
    }

    #[test]
    fn empty_window_yields_empty_results() {
        let (base, modified) = scenario();
        let cmp = compare(
            &base,
            &modified,
            &ColumnSelection::All,
            RowRange::new(Some(2), Some(2)),
        )
        .unwrap();

        assert_eq!(cmp.rows, 1..1);
        let a = cmp.succeeded().next().unwrap();
        assert!(a.is_empty());
        assert_eq!(a.len(), 0);
        assert_eq!(a.max_abs_difference(), None);

        let full = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap();
        assert_eq!(full.succeeded().next().unwrap().len(), 3);
    }

    #[test]
    fn row_range_out_of_bounds_is_fatal() {
        let (base, modified) = scenario();
        let err = compare(
            &base,
            &modified,
            &ColumnSelection::All,
            RowRange::new(None, Some(10)),
        )
        .unwrap_err();
        assert!(matches!(err, CompareError::InvalidRowRange { row_count: 3, .. }));
    }

    #[test]
    fn padded_headers_match_plain_headers() {
        let base = dataset("base.csv", "Date/Time, A \nt,1\nu,2\n");
        let modified = dataset("mod.csv", "Date/Time,A\nt,1\nu,3\n");

        let cmp = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap();
        let a = cmp.succeeded().next().unwrap();
        assert_eq!(a.column, "A");
        assert_eq!(a.difference, vec![0.0, -1.0]);

        let cmp = compare(&base, &modified, &" A".into(), RowRange::default()).unwrap();
        assert_eq!(cmp.succeeded().count(), 1);
    }

    #[test]
    fn non_numeric_column_is_isolated() {
        let base = dataset("base.csv", "X,Y\nfoo,1\nbar,2\n");
        let modified = dataset("mod.csv", "X,Y\nfoo,1\nbaz,4\n");

        let cmp = compare(&base, &modified, &ColumnSelection::All, RowRange::default()).unwrap();
        assert_eq!(cmp.columns.len(), 2);

        let failed: Vec<_> = cmp.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].column(), "X");
        assert!(matches!(failed[0], ColumnError::NonNumeric { .. }));

        let y = cmp.succeeded().next().unwrap();
        assert_eq!(y.column, "Y");
        assert_eq!(y.difference, vec![0.0, -2.0]);
    }

    #[test]
    fn missing_cells_become_gaps() {
        let base = dataset("base.csv", "A,B\n1,1\n,2\n");
        let modified = dataset("mod.csv", "A,B\n1,1\n,2\n");

        let cmp = compare(&base, &modified, &"A".into(), RowRange::default()).unwrap();
        let a = cmp.succeeded().next().unwrap();
        assert_eq!(a.difference[0], 0.0);
        assert!(a.difference[1].is_nan());
        assert!(a.is_identical());
        assert_eq!(a.max_abs_difference(), Some(0.0));
    }

    #[test]
    fn into_parts_keeps_order() {
        let base = dataset("base.csv", "A,T,B\n1,x,2\n");
        let modified = dataset("mod.csv", "A,T,B\n1,y,3\n");

        let (ok, failed) = compare(&base, &modified, &ColumnSelection::All, RowRange::default())
            .unwrap()
            .into_parts();
        assert_eq!(ok.iter().map(|r| r.column.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].column(), "T");
    }
}
