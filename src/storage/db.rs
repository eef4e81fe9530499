use crate::schema::{DATA_COLUMNS, DATA_TABLE, INFO_COLUMNS, INFO_TABLE};
use crate::spreadsheet::SpreadsheetError;
use crate::table::{Column, Table, TableError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported database URL '{0}', expected sqlite:///<path> or :memory:")]
    UnsupportedUrl(String),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("data row {row}: expected {expected} values, got {got}")]
    RowWidth {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("sheet row {row}: id {value:?} is not an integer")]
    InvalidId { row: usize, value: String },
}

/// Where the SQLite database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parses `sqlite:///relative.db`, `sqlite:////abs/path.db`, `:memory:`,
    /// `sqlite://` (in memory) or a bare file path.
    pub fn parse(url: &str) -> Result<Self, StorageError> {
        let url = url.trim();
        if url == ":memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        let path = match url.strip_prefix("sqlite://") {
            Some("") => return Ok(DatabaseLocation::Memory),
            Some(rest) => match rest.strip_prefix('/') {
                Some(":memory:") => return Ok(DatabaseLocation::Memory),
                Some(path) if !path.is_empty() => path,
                _ => return Err(StorageError::UnsupportedUrl(url.to_string())),
            },
            None if url.contains("://") || url.is_empty() => {
                return Err(StorageError::UnsupportedUrl(url.to_string()))
            }
            None => url,
        };
        Ok(DatabaseLocation::File(PathBuf::from(path)))
    }
}

/// One row of the `info` table.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoRow {
    pub id: Option<i64>,
    pub var_name: Option<String>,
    pub var_description: Option<String>,
}

/// A SQLite connection holding the `data` and `info` tables.
pub struct Database {
    conn: Connection,
    location: DatabaseLocation,
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn data_table_ddl() -> String {
    let columns: Vec<String> = DATA_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                format!("{} INTEGER PRIMARY KEY", quote(name))
            } else {
                format!("{} REAL", quote(name))
            }
        })
        .collect();
    format!("CREATE TABLE {} ({})", quote(DATA_TABLE), columns.join(", "))
}

fn info_table_ddl() -> String {
    format!(
        "CREATE TABLE {} ({} INTEGER, {} TEXT, {} TEXT)",
        quote(INFO_TABLE),
        quote(INFO_COLUMNS[0]),
        quote(INFO_COLUMNS[1]),
        quote(INFO_COLUMNS[2]),
    )
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        names.join(", "),
        placeholders.join(", ")
    )
}

impl Database {
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let location = DatabaseLocation::parse(url)?;
        let conn = match &location {
            DatabaseLocation::Memory => Connection::open_in_memory()?,
            DatabaseLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
        };
        debug!(?location, "database opened");
        Ok(Self { conn, location })
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// File path of the database, if not in memory.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            DatabaseLocation::File(path) => Some(path),
            DatabaseLocation::Memory => None,
        }
    }

    /// Drops, recreates and fills both tables in one transaction.
    ///
    /// Each data row is `id` followed by the 126 indicators, `None` stored as NULL.
    pub fn replace_indicators(
        &mut self,
        data: &[(i64, Vec<Option<f64>>)],
        info: &[InfoRow],
    ) -> Result<(), StorageError> {
        let width = DATA_COLUMNS.len() - 1;
        if let Some((row, (_, values))) = data
            .iter()
            .enumerate()
            .find(|(_, (_, values))| values.len() != width)
        {
            return Err(StorageError::RowWidth {
                row,
                expected: width,
                got: values.len(),
            });
        }

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; DROP TABLE IF EXISTS {}; {}; {};",
            quote(DATA_TABLE),
            quote(INFO_TABLE),
            data_table_ddl(),
            info_table_ddl(),
        ))?;
        {
            let mut insert = tx.prepare(&insert_sql(DATA_TABLE, &DATA_COLUMNS))?;
            for (id, values) in data {
                let row = std::iter::once(Value::Integer(*id))
                    .chain(values.iter().map(|v| v.map_or(Value::Null, Value::Real)));
                insert.execute(params_from_iter(row))?;
            }

            let mut insert = tx.prepare(&insert_sql(INFO_TABLE, &INFO_COLUMNS))?;
            for row in info {
                insert.execute(rusqlite::params![row.id, row.var_name, row.var_description])?;
            }
        }
        tx.commit()?;
        info!(data_rows = data.len(), info_rows = info.len(), "indicator tables replaced");
        Ok(())
    }

    /// Every row of `data`, ordered by id, as an all-numeric table.
    pub fn load_indicators(&self) -> Result<Table, StorageError> {
        let columns: Vec<String> = DATA_COLUMNS.iter().map(|c| quote(c)).collect();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            columns.join(", "),
            quote(DATA_TABLE),
            quote(DATA_COLUMNS[0])
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); DATA_COLUMNS.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (j, column) in values.iter_mut().enumerate() {
                column.push(row.get::<_, Option<f64>>(j)?);
            }
        }

        let mut table = Table::new();
        for (name, column) in DATA_COLUMNS.iter().zip(values) {
            table.push_column(*name, Column::Numeric(column))?;
        }
        Ok(table)
    }

    pub fn load_info(&self) -> Result<Vec<InfoRow>, StorageError> {
        let sql = format!(
            "SELECT {}, {}, {} FROM {} ORDER BY rowid",
            quote(INFO_COLUMNS[0]),
            quote(INFO_COLUMNS[1]),
            quote(INFO_COLUMNS[2]),
            quote(INFO_TABLE)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(InfoRow {
                id: row.get(0)?,
                var_name: row.get(1)?,
                var_description: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count_rows(&self, table: &str) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}
