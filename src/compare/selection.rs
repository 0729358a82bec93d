//! Column selection and row window inputs for a comparison run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Which columns to compare.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Every column present in both files, except the timestamp column.
    #[default]
    All,
    Single(String),
    /// Explicit ordered list. Duplicates are compared once.
    List(Vec<String>),
}

impl From<&str> for ColumnSelection {
    fn from(name: &str) -> Self {
        ColumnSelection::Single(name.to_string())
    }
}

impl From<Vec<String>> for ColumnSelection {
    fn from(names: Vec<String>) -> Self {
        match names.len() {
            0 => ColumnSelection::All,
            _ => ColumnSelection::List(names),
        }
    }
}

/// 1-based row bounds. `None` means first row / last row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub low: Option<usize>,
    pub high: Option<usize>,
}

impl RowRange {
    pub fn new(low: Option<usize>, high: Option<usize>) -> Self {
        Self { low, high }
    }

    /// Positional slice `[low - 1, high - 1)`, defaulting to `[0, row_count)`.
    ///
    /// The upper index is exclusive, so `low = 1, high = 2` selects row 1 only.
    pub fn resolve(&self, row_count: usize) -> Result<Range<usize>, &'static str> {
        if self.low == Some(0) {
            return Err("low row must be at least 1");
        }
        if self.high == Some(0) {
            return Err("high row must be at least 1");
        }
        if let Some(high) = self.high {
            if high > row_count {
                return Err("high row exceeds the number of rows");
            }
        }
        if let Some(low) = self.low {
            if low > row_count {
                return Err("low row exceeds the number of rows");
            }
        }
        if let (Some(low), Some(high)) = (self.low, self.high) {
            if low > high {
                return Err("low row is greater than high row");
            }
        }

        let start = self.low.map_or(0, |low| low - 1);
        let end = self.high.map_or(row_count, |high| high - 1);
        Ok(start..end)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.low {
            Some(low) => write!(f, "{}", low)?,
            None => write!(f, "first")?,
        }
        write!(f, "..")?;
        match self.high {
            Some(high) => write!(f, "{}", high),
            None => write!(f, "last"),
        }
    }
}
