//! Data module - CSV loading

mod loader;

pub use loader::{Dataset, LoaderError, INDEX_COLUMN};
