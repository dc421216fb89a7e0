//! Consolidation of several canonical files into one summary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use report_harvest_models::SummaryArtifact;

use crate::{Cell, TabularError, TabularIo, Table};

/// Name of the provenance column added to every summary row.
pub const SOURCE_FILE_COLUMN: &str = "__source_file";

/// Errors from [`merge_to_summary`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// None of the inputs exist on disk. No output is written.
    #[error("no spreadsheets to merge into {0}")]
    NoInputs(PathBuf),

    /// An input exists but could not be read.
    #[error("could not read {path}: {source}")]
    Read {
        /// The unreadable input.
        path: PathBuf,
        /// Underlying cause.
        source: TabularError,
    },

    /// The summary could not be written.
    #[error("could not write {path}: {source}")]
    Write {
        /// The summary target.
        path: PathBuf,
        /// Underlying cause.
        source: TabularError,
    },

    /// Creating the output directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Concatenates the existing `inputs` into a single spreadsheet at `out`.
///
/// Inputs missing from disk are skipped. Columns are aligned by name in
/// order of first appearance, then [`SOURCE_FILE_COLUMN`] holds each row's
/// source filename, then every `(name, value)` in `constant_columns` is set
/// on all rows. An existing file at `out` is replaced.
///
/// # Errors
///
/// Returns [`MergeError::NoInputs`] if no input exists, or another
/// [`MergeError`] if reading an input or writing the summary fails.
pub fn merge_to_summary(
    io: &impl TabularIo,
    inputs: &[PathBuf],
    out: &Path,
    constant_columns: &[(String, String)],
) -> Result<SummaryArtifact, MergeError> {
    let mut frames: Vec<(PathBuf, Table)> = Vec::new();

    for path in inputs {
        if !path.exists() {
            log::warn!("Skipping missing spreadsheet {}", path.display());
            continue;
        }
        let table = io.read_spreadsheet(path).map_err(|source| MergeError::Read {
            path: path.clone(),
            source,
        })?;
        frames.push((path.clone(), table));
    }

    if frames.is_empty() {
        return Err(MergeError::NoInputs(
            out.parent().unwrap_or(out).to_path_buf(),
        ));
    }

    let mut merged = concat(&frames);

    for (name, value) in constant_columns {
        merged.set_constant_column(name, &Cell::from(value.as_str()));
    }

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    io.write_spreadsheet(&merged, out)
        .map_err(|source| MergeError::Write {
            path: out.to_path_buf(),
            source,
        })?;

    log::info!(
        "Merged {} file(s), {} rows -> {}",
        frames.len(),
        merged.len(),
        out.display()
    );

    Ok(SummaryArtifact {
        path: out.to_path_buf(),
        sources: frames.into_iter().map(|(path, _)| path).collect(),
    })
}

/// Outer-joins the frames' columns by name and stacks their rows.
///
/// A name repeated within one frame maps to a distinct output column per
/// occurrence.
fn concat(frames: &[(PathBuf, Table)]) -> Table {
    let mut headers: Vec<String> = Vec::new();
    let mut slots: HashMap<(String, usize), usize> = HashMap::new();
    let mut mappings: Vec<Vec<usize>> = Vec::with_capacity(frames.len());

    for (_, table) in frames {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mapping = table
            .headers
            .iter()
            .map(|name| {
                let nth = seen.entry(name.as_str()).or_default();
                let key = (name.clone(), *nth);
                *nth += 1;
                *slots.entry(key).or_insert_with(|| {
                    headers.push(name.clone());
                    headers.len() - 1
                })
            })
            .collect();
        mappings.push(mapping);
    }

    let width = headers.len();
    headers.push(SOURCE_FILE_COLUMN.to_owned());

    let mut merged = Table {
        headers,
        rows: Vec::new(),
    };

    for ((path, table), mapping) in frames.iter().zip(&mappings) {
        let source = Cell::Text(
            path.file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned()),
        );
        for row in &table.rows {
            let mut out = vec![Cell::Empty; width];
            for (cell, &slot) in row.iter().zip(mapping) {
                out[slot] = cell.clone();
            }
            out.push(source.clone());
            merged.rows.push(out);
        }
    }

    merged
}
