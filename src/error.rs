use crate::artifacts::ArtifactError;
use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::literal::LiteralError;
use crate::preprocessing::PreprocessingError;
use crate::registry::UnknownModel;
use crate::scrape::ScrapeError;
use crate::spreadsheet::SpreadsheetError;
use crate::storage::StorageError;
use crate::table::TableError;
use crate::trainer::TrainingError;
use thiserror::Error;

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error(transparent)]
    UnknownModel(#[from] UnknownModel),
}

pub type Result<T> = std::result::Result<T, Error>;
