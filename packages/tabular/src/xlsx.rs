//! `.xlsx` backend for [`TabularIo`].
//!
//! Writes with `rust_xlsxwriter` and reads the first worksheet back with
//! `calamine`. The header occupies row 0; data starts at row 1.
//!
//! Rows whose cells are all empty are still part of the table. They are
//! written as a blank cell in column 0 so the sheet dimension covers them,
//! and reading walks every row up to that dimension rather than stopping at
//! the last non-empty cell.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{Data, Reader as _, Xlsx, open_workbook};
use rust_xlsxwriter::{Format, Workbook};

use crate::table::parse_delimited;
use crate::{Cell, TabularError, TabularIo, Table, TextEncoding};

/// File extension of the canonical format.
pub const CANONICAL_EXTENSION: &str = "xlsx";

/// Canonical spreadsheet backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxIo;

impl TabularIo for XlsxIo {
    fn read_delimited(&self, path: &Path, encoding: TextEncoding) -> Result<Table, TabularError> {
        let bytes = std::fs::read(path)?;
        let text = encoding
            .decode(&bytes)
            .ok_or(TabularError::Decode { encoding })?;
        parse_delimited(&text)
    }

    fn write_spreadsheet(&self, table: &Table, path: &Path) -> Result<(), TabularError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in table.headers.iter().enumerate() {
            sheet.write_string(0, col_num(col)?, header)?;
        }

        let blank = Format::new();
        for (i, row) in table.rows.iter().enumerate() {
            let row_num = row_num(i + 1)?;
            if !row.is_empty() && row.iter().all(|cell| *cell == Cell::Empty) {
                sheet.write_blank(row_num, 0, &blank)?;
                continue;
            }
            for (col, cell) in row.iter().enumerate() {
                let col = col_num(col)?;
                match cell {
                    Cell::Empty => {}
                    Cell::Number(n) => {
                        sheet.write_number(row_num, col, *n)?;
                    }
                    Cell::Bool(b) => {
                        sheet.write_boolean(row_num, col, *b)?;
                    }
                    Cell::Text(s) => {
                        sheet.write_string(row_num, col, s)?;
                    }
                }
            }
        }

        workbook.save(path)?;
        log::debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    fn read_spreadsheet(&self, path: &Path) -> Result<Table, TabularError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let Some(name) = workbook.sheet_names().first().cloned() else {
            return Err(TabularError::Parse(format!(
                "{} contains no worksheets",
                path.display()
            )));
        };

        let mut reader = workbook.worksheet_cells_reader(&name)?;
        let dimensions = reader.dimensions();
        let mut last_row = dimensions.end.0;
        let mut last_col = dimensions.end.1;
        let mut cells = BTreeMap::new();
        while let Some(cell) = reader.next_cell()? {
            let (row, col) = cell.get_position();
            last_row = last_row.max(row);
            last_col = last_col.max(col);
            cells.insert((row, col), Data::from(cell.get_value().clone()));
        }

        let Some(&(header_row, _)) = cells.keys().next() else {
            return Ok(Table::default());
        };
        let width = last_col + 1;

        let mut table = Table::with_headers((0..width).map(|col| {
            match cells.get(&(header_row, col)) {
                None | Some(Data::Empty) => String::new(),
                Some(other) => other.to_string(),
            }
        }));

        for row in header_row + 1..=last_row {
            table.push_row(
                (0..width)
                    .map(|col| cells.get(&(row, col)).map_or(Cell::Empty, cell_from_data))
                    .collect(),
            )?;
        }

        Ok(table)
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        other => Cell::Text(other.to_string()),
    }
}

fn row_num(idx: usize) -> Result<u32, TabularError> {
    u32::try_from(idx).map_err(|_| TabularError::TooLarge(format!("row {idx}")))
}

fn col_num(idx: usize) -> Result<u16, TabularError> {
    u16::try_from(idx).map_err(|_| TabularError::TooLarge(format!("column {idx}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_keeps_headers_and_cell_types() {
        let tmp = std::env::temp_dir().join("report_harvest_xlsx_round_trip");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("table.xlsx");

        let mut table = Table::with_headers(["門市".to_owned(), "orders".to_owned()]);
        table
            .push_row(vec![Cell::from("日植"), Cell::Number(12.5)])
            .unwrap();
        table.push_row(vec![Cell::Empty, Cell::Number(3.0)]).unwrap();

        XlsxIo.write_spreadsheet(&table, &path).unwrap();
        let read = XlsxIo.read_spreadsheet(&path).unwrap();

        assert_eq!(read.headers, ["門市", "orders"]);
        assert_eq!(read.len(), 2);
        assert_eq!(read.rows[0][0], Cell::from("日植"));
        assert_eq!(read.rows[0][1], Cell::Number(12.5));
        assert_eq!(read.rows[1][0], Cell::Empty);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn blank_rows_survive_between_and_after_data() {
        let tmp = std::env::temp_dir().join("report_harvest_xlsx_blank_rows");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("table.xlsx");

        let mut table = Table::with_headers(["a".to_owned(), "b".to_owned()]);
        table.push_row(vec![Cell::Empty, Cell::Empty]).unwrap();
        table.push_row(vec![Cell::from("x"), Cell::Empty]).unwrap();
        table.push_row(vec![Cell::Empty, Cell::Empty]).unwrap();

        XlsxIo.write_spreadsheet(&table, &path).unwrap();
        let read = XlsxIo.read_spreadsheet(&path).unwrap();

        assert_eq!(read, table);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn read_delimited_reports_decode_failures() {
        let tmp = std::env::temp_dir().join("report_harvest_xlsx_decode");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("raw.csv");
        std::fs::write(&path, b"\xA4\xA4\xA4\xE5,b\n1,2\n").unwrap();

        let err = XlsxIo.read_delimited(&path, TextEncoding::Utf8).unwrap_err();
        assert!(matches!(
            err,
            TabularError::Decode {
                encoding: TextEncoding::Utf8
            }
        ));

        let table = XlsxIo.read_delimited(&path, TextEncoding::Big5).unwrap();
        assert_eq!(table.headers, ["中文", "b"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
