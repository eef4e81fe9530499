//! Typed columnar table shared by the loader, the dataset split and preprocessing.
//!
//! A [`Table`] is an ordered list of named columns of equal length. Each column
//! is either numeric or text; the kind decides how preprocessing treats it
//! (scaled vs one-hot encoded). Missing cells are `None`, and a numeric `NaN`
//! counts as missing too.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{column}' has {got} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("row index {index} out of range for {rows} rows")]
    RowOutOfRange { index: usize, rows: usize },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Kind of a column, as seen by preprocessing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Text(_) => ColumnKind::Categorical,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => matches!(v.get(row), Some(cell) if cell.map_or(true, f64::is_nan)),
            Column::Text(v) => matches!(v.get(row), Some(None)),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Fraction of missing cells; `0.0` for an empty column.
    pub fn missing_fraction(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.missing_count() as f64 / self.len() as f64
        }
    }

    /// Numeric view with missing cells as `NaN`; text cells parse or become `NaN`.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Column::Numeric(v) => v.iter().map(|x| x.unwrap_or(f64::NAN)).collect(),
            Column::Text(v) => v
                .iter()
                .map(|x| {
                    x.as_deref()
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .unwrap_or(f64::NAN)
                })
                .collect(),
        }
    }

    /// Text view; numbers are rendered with their shortest representation.
    pub fn to_text(&self) -> Vec<Option<String>> {
        match self {
            Column::Numeric(v) => v
                .iter()
                .map(|x| x.filter(|f| !f.is_nan()).map(|f| f.to_string()))
                .collect(),
            Column::Text(v) => v.clone(),
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, column)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), TableError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.n_rows,
                got: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.column_index(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Copy of the table restricted to `names`, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let mut out = Table::new();
        for name in names {
            let name = name.as_ref();
            out.push_column(name, self.column(name)?.clone())?;
        }
        if out.columns.is_empty() {
            out.n_rows = self.n_rows;
        }
        Ok(out)
    }

    /// Copy of the table without the named column.
    pub fn without(&self, name: &str) -> Result<Table, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        let mut out = self.clone();
        out.names.remove(idx);
        out.columns.remove(idx);
        Ok(out)
    }

    /// Copy of the table holding the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Result<Table, TableError> {
        if let Some(&index) = rows.iter().find(|&&i| i >= self.n_rows) {
            return Err(TableError::RowOutOfRange {
                index,
                rows: self.n_rows,
            });
        }
        Ok(Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        })
    }

    /// Copy of the table keeping rows where the named column has a value.
    pub fn drop_missing(&self, name: &str) -> Result<Table, TableError> {
        let column = self.column(name)?;
        let keep: Vec<usize> = (0..self.n_rows).filter(|&r| !column.is_missing(r)).collect();
        self.take_rows(&keep)
    }

    /// Reads a headered CSV. A column is numeric when every non-empty cell
    /// parses as a number, text otherwise.
    pub fn from_csv<R: Read>(reader: R) -> Result<Table, TableError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for record in rdr.records() {
            let record = record?;
            for (col, cells) in raw.iter_mut().enumerate() {
                let cell = record.get(col).map(str::trim).filter(|s| !s.is_empty());
                cells.push(cell.map(str::to_string));
            }
        }

        let mut seen = HashSet::new();
        let mut table = Table::new();
        for (name, cells) in headers.into_iter().zip(raw) {
            if !seen.insert(name.clone()) {
                return Err(TableError::DuplicateColumn(name));
            }
            table.push_column(name, infer_column(cells))?;
        }
        Ok(table)
    }
}

/// Numeric when all present cells parse as `f64`.
pub fn infer_column(cells: Vec<Option<String>>) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.trim().parse::<f64>().ok().map(Some),
        })
        .collect();
    match parsed {
        Some(values) => Column::Numeric(values),
        None => Column::Text(cells),
    }
}
