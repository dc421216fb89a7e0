//! In-memory table shared by the delimited reader, the spreadsheet backend
//! and the merger.

use crate::TabularError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value.
    Empty,
    /// A finite number.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// Anything else, verbatim.
    Text(String),
}

impl Cell {
    /// Infers a typed cell from a raw text field.
    ///
    /// Empty fields stay empty and finite numbers become
    /// [`Cell::Number`]. Everything else is kept as text.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Empty;
        }
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_owned()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A header row plus data rows. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names.
    pub headers: Vec<String>,
    /// Data rows, header excluded.
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given headers.
    ///
    /// Blank header names are replaced with `Unnamed: <index>`.
    #[must_use]
    pub fn with_headers(headers: impl IntoIterator<Item = String>) -> Self {
        let headers = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if h.is_empty() {
                    format!("Unnamed: {i}")
                } else {
                    h.to_owned()
                }
            })
            .collect();
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding short rows with [`Cell::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`TabularError::Parse`] if the row has more cells than there
    /// are headers.
    pub fn push_row(&mut self, mut row: Vec<Cell>) -> Result<(), TabularError> {
        if row.len() > self.headers.len() {
            return Err(TabularError::Parse(format!(
                "row {} has {} fields, expected at most {}",
                self.rows.len() + 1,
                row.len(),
                self.headers.len()
            )));
        }
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
        Ok(())
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Sets every row's `name` column to `value`, appending the column if it
    /// does not exist yet.
    pub fn set_constant_column(&mut self, name: &str, value: &Cell) {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = value.clone();
            }
        } else {
            self.headers.push(name.to_owned());
            for row in &mut self.rows {
                row.push(value.clone());
            }
        }
    }

    /// Iterates over the values of column `idx`.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| &row[idx])
    }
}

/// Parses comma-delimited text into a [`Table`].
///
/// A leading byte-order mark is ignored. The first record is the header.
///
/// # Errors
///
/// Returns [`TabularError`] if the text has no header row, a record cannot
/// be tokenized, or a record has more fields than the header.
pub fn parse_delimited(text: &str) -> Result<Table, TabularError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    if headers.is_empty() {
        return Err(TabularError::Parse(
            "delimited file contains no header row".to_owned(),
        ));
    }

    let mut table = Table::with_headers(headers);

    for result in reader.records() {
        let record = result?;
        table.push_row(record.iter().map(Cell::infer).collect())?;
    }

    Ok(table)
}
