//! Raw export → canonical spreadsheet conversion.

use std::path::{Path, PathBuf};

use crate::{ENCODINGS_TO_TRY, TabularError, TabularIo};

/// Errors from [`convert_to_canonical`].
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// No candidate encoding produced a parseable table. The raw file is
    /// left in place.
    #[error("could not convert {path}: no encoding parsed the file (last error: {last})")]
    Exhausted {
        /// The raw export.
        path: PathBuf,
        /// The error from the final candidate encoding.
        last: TabularError,
    },

    /// The export parsed but the canonical file could not be written.
    #[error("could not write {path}: {source}")]
    Write {
        /// The canonical target.
        path: PathBuf,
        /// Underlying cause.
        source: TabularError,
    },

    /// Creating the target directory or removing the raw file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts the delimited export at `raw` into a spreadsheet at `target`.
///
/// Each encoding in [`ENCODINGS_TO_TRY`] is tried in order and the first
/// one that parses wins. On success the raw file is deleted so only the
/// canonical form remains, and `target` is returned.
///
/// # Errors
///
/// Returns [`ConversionError::Exhausted`] if every encoding fails, leaving
/// `raw` untouched, or [`ConversionError::Write`] if the spreadsheet cannot
/// be written.
pub fn convert_to_canonical(
    io: &impl TabularIo,
    raw: &Path,
    target: &Path,
) -> Result<PathBuf, ConversionError> {
    let mut last_error = None;

    for encoding in ENCODINGS_TO_TRY {
        let table = match io.read_delimited(raw, encoding) {
            Ok(table) => table,
            Err(e) => {
                log::debug!("{} is not readable as {encoding}: {e}", raw.display());
                last_error = Some(e);
                continue;
            }
        };

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        io.write_spreadsheet(&table, target)
            .map_err(|source| ConversionError::Write {
                path: target.to_path_buf(),
                source,
            })?;

        if raw != target {
            match std::fs::remove_file(raw) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        log::info!(
            "Converted {} ({encoding}, {} rows) -> {}",
            raw.display(),
            table.len(),
            target.display()
        );
        return Ok(target.to_path_buf());
    }

    Err(ConversionError::Exhausted {
        path: raw.to_path_buf(),
        last: last_error.unwrap_or_else(|| {
            TabularError::Parse("no candidate encodings configured".to_owned())
        }),
    })
}
