//! Series Diff - Baseline vs Modified CSV Comparison
//!
//! Compares two CSV time-series exports column by column and renders one
//! chart per column showing the baseline, the modified run and their delta.

pub mod archive;
pub mod charts;
pub mod compare;
pub mod data;
pub mod report;
pub mod runner;

pub use compare::{compare, ColumnSelection, Comparison, ComparisonResult, RowRange};
pub use data::Dataset;
pub use runner::{run, RunConfig, RunError};
