//! End-to-end workflows shared by the CLI and the REST service.

use crate::artifacts::ArtifactStore;
use crate::config::Settings;
use crate::dataset::TabularDataset;
use crate::error::Result;
use crate::logging::timed;
use crate::pipe::{FittedPipe, Pipe};
use crate::registry::ModelKind;
use crate::scrape::{Assembler, HttpFetcher};
use crate::storage::{load_workbook, Database, LoadSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Name given to the dataset built from the relational store.
pub const DATASET_NAME: &str = "data";

/// Reloads the relational store from the configured workbook.
pub fn import_data(settings: &Settings) -> Result<LoadSummary> {
    let mut db = Database::open(&settings.sqlalchemy_database)?;
    Ok(load_workbook(&settings.data_path, &mut db)?)
}

/// Reloads the store only when `UPDATE_DATA` is set.
pub fn import_if_requested(settings: &Settings) -> Result<Option<LoadSummary>> {
    if settings.update_data {
        import_data(settings).map(Some)
    } else {
        Ok(None)
    }
}

/// Trains `kind` on the stored indicators and persists the fitted pipe.
///
/// Hyperparameters come from the family's parameter file when one exists.
/// Rows without a target value are dropped before splitting.
pub fn train(settings: &Settings, kind: ModelKind) -> Result<PathBuf> {
    timed("train", || {
        let store = ArtifactStore::from_settings(settings);
        store.ensure_dirs()?;
        let hyperparameters = store.load_hyperparameters(kind)?;

        let db = Database::open(&settings.sqlalchemy_database)?;
        let table = db.load_indicators()?;
        let labelled = table.drop_missing(&settings.target)?;
        if labelled.n_rows() < table.n_rows() {
            warn!(
                dropped = table.n_rows() - labelled.n_rows(),
                target = %settings.target,
                "rows without target dropped"
            );
        }

        let dataset = TabularDataset::new(
            &labelled,
            DATASET_NAME,
            &settings.target,
            settings.test_size,
            Some(&settings.storage_path),
            settings.random_state,
        )?;
        let (_, path) = Pipe::new(dataset, kind).fit(hyperparameters.as_ref(), store.models_dir())?;
        info!(model = %kind, artifact = %path.display(), "model trained");
        Ok(path)
    })
}

/// Loads a fitted pipe and writes predictions for its held-out rows.
///
/// A bare file name is looked up in the estimated-models directory.
pub fn predict(settings: &Settings, artifact: &Path) -> Result<PathBuf> {
    timed("predict", || {
        let store = ArtifactStore::from_settings(settings);
        let path = if artifact.components().count() == 1 && !artifact.exists() {
            store.models_dir().join(artifact)
        } else {
            artifact.to_path_buf()
        };
        let pipe = FittedPipe::load(&path)?;
        pipe.save_predictions(store.predictions_dir())
    })
}

/// Crawls the monitoring site and overwrites the configured workbook.
pub fn scrape(settings: &Settings) -> Result<PathBuf> {
    timed("scrape", || {
        let fetcher = HttpFetcher::new(Duration::from_secs(settings.request_timeout_secs))?;
        let dataset = Assembler::new(
            fetcher,
            settings.scrape_base_url.clone(),
            settings.scrape_reference_page.clone(),
        )
        .assemble()?;
        dataset.write(&settings.scrape_output_path)?;
        Ok(settings.scrape_output_path.clone())
    })
}
