//! Output Archive Module
//! Packages a directory of chart images into a single ZIP file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Archive {archive} would be written inside the directory it packages")]
    InsideSource { archive: PathBuf },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Zip every regular file directly under `source_dir` into `destination`.
///
/// Entries are stored as `<dir name>/<file name>`, so extracting the archive
/// recreates the directory. Returns the number of files written.
pub fn zip_directory(source_dir: &Path, destination: &Path) -> Result<usize, ArchiveError> {
    let source_abs = fs::canonicalize(source_dir).map_err(io_err(source_dir))?;
    let dest_parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let dest_parent_abs = fs::canonicalize(dest_parent).map_err(io_err(dest_parent))?;
    if dest_parent_abs.starts_with(&source_abs) {
        return Err(ArchiveError::InsideSource {
            archive: destination.to_path_buf(),
        });
    }

    let prefix = source_abs
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    let mut entries: Vec<PathBuf> = fs::read_dir(source_dir)
        .map_err(io_err(source_dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let file = File::create(destination).map_err(io_err(destination))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        zip.start_file(format!("{}/{}", prefix, name), options)?;
        let bytes = fs::read(path).map_err(io_err(path))?;
        zip.write_all(&bytes).map_err(io_err(path))?;
    }

    zip.finish()?;

    log::info!(
        "Archive written: {} ({} files)",
        destination.display(),
        entries.len()
    );
    Ok(entries.len())
}
