//! CSV Data Loader Module
//! Parses a delimited export into a named-column Polars DataFrame.

use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp column written by the simulation exports. Never compared as a series.
pub const INDEX_COLUMN: &str = "Date/Time";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to parse {file}: no header row")]
    MissingHeader { file: String },
    #[error("Failed to parse {file}: column '{column}' appears more than once")]
    DuplicateColumn { file: String, column: String },
    #[error("Failed to build table for {file}: {source}")]
    Frame {
        file: String,
        #[source]
        source: PolarsError,
    },
}

/// One parsed CSV export. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: String,
    df: DataFrame,
}

impl Dataset {
    /// Load a CSV file from disk. The file name becomes the dataset's source identifier.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source_id = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_reader(source_id, file)
    }

    /// Parse CSV text from any reader.
    ///
    /// Header names are trimmed, rows must match the header width, and every
    /// column whose non-empty cells all parse as numbers is stored as Float64.
    pub fn from_reader(source_id: impl Into<String>, input: impl Read) -> Result<Self, LoaderError> {
        let file = source_id.into();
        let parse_err = |source: csv::Error| LoaderError::Parse {
            file: file.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let names: Vec<String> = reader
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        if names.is_empty() || names.iter().all(|name| name.is_empty()) {
            return Err(LoaderError::MissingHeader { file: file.clone() });
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(LoaderError::DuplicateColumn {
                    file: file.clone(),
                    column: name.clone(),
                });
            }
        }

        // Column-major buffers
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record.map_err(parse_err)?;
            for (buffer, value) in cells.iter_mut().zip(record.iter()) {
                buffer.push(value.to_string());
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(cells)
            .map(|(name, values)| Self::build_column(name, values))
            .collect();

        let df = DataFrame::new(columns).map_err(|source| LoaderError::Frame {
            file: file.clone(),
            source,
        })?;

        log::debug!(
            "Loaded {}: {} rows x {} columns",
            file,
            df.height(),
            df.width()
        );

        Ok(Self { source: file, df })
    }

    /// Numeric when every non-empty cell parses as f64, text otherwise.
    fn build_column(name: &str, values: Vec<String>) -> Column {
        let numeric: Option<Vec<Option<f64>>> = values
            .iter()
            .map(|raw| {
                let cell = raw.trim();
                if cell.is_empty() {
                    Some(None)
                } else {
                    cell.parse::<f64>().ok().map(Some)
                }
            })
            .collect();

        match numeric {
            Some(floats) => Column::new(name.into(), floats),
            None => {
                let text: Vec<Option<String>> = values
                    .into_iter()
                    .map(|raw| if raw.trim().is_empty() { None } else { Some(raw) })
                    .collect();
                Column::new(name.into(), text)
            }
        }
    }

    /// Source identifier (file name) used in error messages.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of data rows, header excluded.
    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    /// Column names in file order, already trimmed.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Whether a column with this exact (trimmed) name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Get a reference to the underlying DataFrame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }
}
