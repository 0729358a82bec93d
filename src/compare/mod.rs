//! Compare module - column matching, row alignment and differences

mod engine;
mod selection;

pub use engine::{compare, ColumnError, CompareError, Comparison, ComparisonResult};
pub use selection::{ColumnSelection, RowRange};
