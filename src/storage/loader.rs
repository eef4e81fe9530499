use crate::logging::timed;
use crate::schema::{DATA_COLUMNS, DATA_SHEET, INFO_SHEET};
use crate::spreadsheet::{read_sheet, Cell};
use crate::storage::db::{Database, InfoRow, StorageError};
use std::path::Path;
use tracing::warn;

/// Row counts written by [`load_workbook`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    pub data_rows: usize,
    pub info_rows: usize,
}

fn cell(row: &[Cell], col: usize) -> &Cell {
    row.get(col).unwrap_or(&Cell::Empty)
}

fn parse_id(row: usize, cell: &Cell) -> Result<i64, StorageError> {
    match cell.as_number() {
        Some(n) if n.fract() == 0.0 => Ok(n as i64),
        _ => Err(StorageError::InvalidId {
            row,
            value: cell.as_text().unwrap_or_default(),
        }),
    }
}

/// Reads the `data` and `about` sheets without touching the database.
///
/// Data rows start below the header and end at the first row with an empty
/// id cell; indicator cells that are neither numbers nor numeric text become
/// `None`. Metadata rows end at the first fully empty row.
pub fn read_workbook(
    path: impl AsRef<Path>,
) -> Result<(Vec<(i64, Vec<Option<f64>>)>, Vec<InfoRow>), StorageError> {
    let path = path.as_ref();

    let grid = read_sheet(path, DATA_SHEET)?;
    let mut data = Vec::new();
    for (r, row) in grid.iter().enumerate().skip(1) {
        let id_cell = cell(row, 0);
        if id_cell.is_empty() {
            break;
        }
        let id = parse_id(r + 1, id_cell)?;
        let values = (1..DATA_COLUMNS.len())
            .map(|col| cell(row, col).as_number())
            .collect();
        data.push((id, values));
    }

    let grid = read_sheet(path, INFO_SHEET)?;
    let mut info = Vec::new();
    for row in grid.iter().skip(1) {
        if row.iter().all(Cell::is_empty) {
            break;
        }
        info.push(InfoRow {
            id: cell(row, 0).as_number().map(|n| n as i64),
            var_name: cell(row, 1).as_text(),
            var_description: cell(row, 2).as_text(),
        });
    }
    Ok((data, info))
}

/// Replaces the relational tables with the contents of the workbook at `path`.
pub fn load_workbook(path: impl AsRef<Path>, db: &mut Database) -> Result<LoadSummary, StorageError> {
    let path = path.as_ref();
    timed("load_workbook", || {
        let (data, info) = read_workbook(path)?;
        if data.is_empty() {
            warn!(path = %path.display(), "data sheet has no rows");
        }
        db.replace_indicators(&data, &info)?;
        Ok(LoadSummary {
            data_rows: data.len(),
            info_rows: info.len(),
        })
    })
}
