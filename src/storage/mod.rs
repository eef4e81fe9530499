//! Relational storage of the indicator workbook.
//!
//! [`load_workbook`] replaces the `data` and `info` tables from the workbook's
//! `data` and `about` sheets; [`Database::load_indicators`] reads the wide
//! table back for training.

pub mod db;
pub mod loader;

pub use db::{Database, DatabaseLocation, InfoRow, StorageError};
pub use loader::{load_workbook, read_workbook, LoadSummary};
