//! Workbook reading (`calamine`) and writing (`rust_xlsxwriter`).

use crate::table::{Column, Table};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::Error),
    #[error("failed to write workbook: {0}")]
    Write(#[from] XlsxError),
    #[error("sheet '{0}' not found")]
    MissingSheet(String),
    #[error("sheet too large: {0}")]
    TooLarge(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single worksheet cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric value, parsing text with `,` as decimal separator and spaces
    /// as thousands separators.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_number(s),
            Cell::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Empty => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                if s.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.clone())
                }
            }
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// Parses scraped numeric text such as `"1 234,5"` or `"12.0"`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads a worksheet as a grid anchored at `A1`.
pub fn read_sheet(path: impl AsRef<Path>, sheet: &str) -> Result<Vec<Vec<Cell>>, SpreadsheetError> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    if !workbook.sheet_names().iter().any(|n| n == sheet) {
        return Err(SpreadsheetError::MissingSheet(sheet.to_string()));
    }
    let range = workbook.worksheet_range(sheet)?;

    let (row0, col0) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row0 as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col0 as usize];
        cells.extend(row.iter().map(Cell::from));
        grid.push(cells);
    }
    Ok(grid)
}

/// One worksheet to be written: a header row followed by data rows.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Sheet holding `table`, preceded by an `index` column when given.
    pub fn from_table(name: impl Into<String>, table: &Table, index: Option<&[usize]>) -> Self {
        let mut header = Vec::with_capacity(table.n_cols() + 1);
        if index.is_some() {
            header.push("index".to_string());
        }
        header.extend(table.names().iter().cloned());

        let mut sheet = Sheet::new(name, header);
        for row in 0..table.n_rows() {
            let mut cells = Vec::with_capacity(sheet.header.len());
            if let Some(index) = index {
                cells.push(Cell::Number(index[row] as f64));
            }
            for (_, column) in table.columns() {
                cells.push(match column {
                    Column::Numeric(v) => v[row]
                        .filter(|x| !x.is_nan())
                        .map_or(Cell::Empty, Cell::Number),
                    Column::Text(v) => v[row].clone().map_or(Cell::Empty, Cell::Text),
                });
            }
            sheet.rows.push(cells);
        }
        sheet
    }
}

/// Writes `sheets` into a new workbook at `path`, replacing any existing file.
pub fn write_workbook(path: impl AsRef<Path>, sheets: &[Sheet]) -> Result<(), SpreadsheetError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, title) in sheet.header.iter().enumerate() {
            worksheet.write_string(0, to_col(col)?, title)?;
        }
        for (r, cells) in sheet.rows.iter().enumerate() {
            let row = to_row(r + 1)?;
            for (c, cell) in cells.iter().enumerate() {
                let col = to_col(c)?;
                match cell {
                    Cell::Number(n) if n.is_finite() => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    _ => {}
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

fn to_row(row: usize) -> Result<u32, SpreadsheetError> {
    u32::try_from(row).map_err(|_| SpreadsheetError::TooLarge(format!("row {row}")))
}

fn to_col(col: usize) -> Result<u16, SpreadsheetError> {
    u16::try_from(col).map_err(|_| SpreadsheetError::TooLarge(format!("column {col}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number(" 1 234,5 "), Some(1234.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_cell_conversions() {
        assert_eq!(Cell::from(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(Cell::from(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(Cell::Text("0,25".into()).as_number(), Some(0.25));
        assert_eq!(Cell::Empty.as_text(), None);
    }

    #[test]
    fn test_write_then_read_sheets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("book.xlsx");

        let mut first = Sheet::new("data", vec!["id".into(), "value".into()]);
        first.rows.push(vec![Cell::Number(1.0), Cell::Text("a".into())]);
        first.rows.push(vec![Cell::Number(2.0), Cell::Empty]);
        let second = Sheet::new("about", vec!["id".into()]);

        write_workbook(&path, &[first, second]).unwrap();

        let grid = read_sheet(&path, "data").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][0], Cell::Text("id".into()));
        assert_eq!(grid[1][0], Cell::Number(1.0));
        assert_eq!(grid[1][1], Cell::Text("a".into()));
        assert!(grid[2].get(1).map_or(true, Cell::is_empty));

        assert!(matches!(
            read_sheet(&path, "missing"),
            Err(SpreadsheetError::MissingSheet(_))
        ));
    }

    #[test]
    fn test_sheet_from_table_with_index() {
        let table = Table::from_columns([
            ("x", Column::Numeric(vec![Some(1.5), None])),
            ("label", Column::Text(vec![None, Some("b".into())])),
        ])
        .unwrap();
        let sheet = Sheet::from_table("train", &table, Some(&[7, 3]));
        assert_eq!(sheet.header, vec!["index", "x", "label"]);
        assert_eq!(
            sheet.rows[0],
            vec![Cell::Number(7.0), Cell::Number(1.5), Cell::Empty]
        );
        assert_eq!(
            sheet.rows[1],
            vec![Cell::Number(3.0), Cell::Empty, Cell::Text("b".into())]
        );
    }
}
