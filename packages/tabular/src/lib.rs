#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular I/O for harvested reports.
//!
//! Raw portal exports are delimited text in whatever encoding the portal's
//! backend happened to use. [`convert`] normalizes them into the canonical
//! `.xlsx` format through the [`TabularIo`] capability, and [`merge`]
//! consolidates several canonical files into one summary.
//!
//! [`xlsx::XlsxIo`] is the production backend; the pipeline only depends on
//! the trait.

pub mod convert;
pub mod encoding;
pub mod merge;
pub mod table;
pub mod xlsx;

use std::path::Path;

pub use encoding::{ENCODINGS_TO_TRY, TextEncoding};
pub use table::{Cell, Table};

/// Errors from reading or writing a single table.
#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not valid in the requested encoding.
    #[error("file is not valid {encoding}")]
    Decode {
        /// The encoding that was attempted.
        encoding: TextEncoding,
    },

    /// CSV tokenizing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The delimited text decoded but does not form a table.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Writing the spreadsheet failed.
    #[error("spreadsheet write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// Reading the spreadsheet failed.
    #[error("spreadsheet read error: {0}")]
    Read(#[from] calamine::XlsxError),

    /// The table does not fit within spreadsheet limits.
    #[error("table exceeds spreadsheet limits: {0}")]
    TooLarge(String),
}

/// Structured tabular I/O capability consumed by the converter and merger.
pub trait TabularIo {
    /// Reads a delimited text file decoded with `encoding`.
    ///
    /// # Errors
    ///
    /// Returns [`TabularError`] if the file cannot be read, decoded, or
    /// tokenized into a table.
    fn read_delimited(&self, path: &Path, encoding: TextEncoding) -> Result<Table, TabularError>;

    /// Writes `table` as a canonical spreadsheet, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`TabularError`] if the spreadsheet cannot be written.
    fn write_spreadsheet(&self, table: &Table, path: &Path) -> Result<(), TabularError>;

    /// Reads the first sheet of a canonical spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns [`TabularError`] if the file cannot be opened or has no sheet.
    fn read_spreadsheet(&self, path: &Path) -> Result<Table, TabularError>;
}
