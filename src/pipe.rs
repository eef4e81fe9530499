//! Training/prediction pipe: dataset + preprocessing + estimator, persisted as
//! one bincode artifact.

use crate::artifacts::{timestamp, ArtifactError};
use crate::dataset::TabularDataset;
use crate::error::Result;
use crate::estimator::{Estimator, EstimatorParams, FittedEstimator, Hyperparameters};
use crate::preprocessing::{
    FittedPreprocessor, FittedTransformer, Preprocessor, PreprocessorParams, Transformer,
};
use crate::registry::ModelKind;
use crate::serialization::SerializableParams;
use crate::spreadsheet::{write_workbook, Cell, Sheet};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// An unfitted pipe over one dataset and one model family.
#[derive(Clone, Debug)]
pub struct Pipe {
    dataset: TabularDataset,
    kind: ModelKind,
    preprocessor: Preprocessor,
}

impl Pipe {
    pub fn new(dataset: TabularDataset, kind: ModelKind) -> Self {
        Self {
            dataset,
            kind,
            preprocessor: Preprocessor::default(),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn dataset(&self) -> &TabularDataset {
        &self.dataset
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Fits preprocessing on `x_train`, trains the estimator and writes the
    /// fitted pipe to `<dir>/<ts>_<MODEL>_model.bin`.
    pub fn fit(
        self,
        hyperparameters: Option<&Hyperparameters>,
        dir: impl AsRef<Path>,
    ) -> Result<(FittedPipe, PathBuf)> {
        let estimator = match hyperparameters {
            Some(params) => Estimator::with_hyperparameters(self.kind, params)?,
            None => Estimator::new(self.kind),
        };

        let split = self.dataset.split();
        let preprocessor = self.preprocessor.fit(&split.x_train)?;
        let x_train = preprocessor.transform(&split.x_train)?;
        let y_train = Array1::from(split.y_train.clone());
        let fitted = estimator.fit(x_train, y_train)?;

        let pipe = FittedPipe {
            dataset: self.dataset,
            estimator,
            preprocessor,
            fitted,
        };
        let path = dir
            .as_ref()
            .join(format!("{}_{}_model.bin", timestamp(), self.kind.name()));
        pipe.save(&path)?;
        Ok((pipe, path))
    }
}

#[derive(Serialize, Deserialize)]
struct PipeArtifact {
    dataset: TabularDataset,
    estimator: Estimator,
    preprocessor: PreprocessorParams,
    fitted: EstimatorParams,
}

/// A trained pipe; owns its dataset so predictions need no other input.
#[derive(Clone, Debug)]
pub struct FittedPipe {
    dataset: TabularDataset,
    estimator: Estimator,
    preprocessor: FittedPreprocessor,
    fitted: FittedEstimator,
}

impl FittedPipe {
    pub fn kind(&self) -> ModelKind {
        self.fitted.kind()
    }

    pub fn dataset(&self) -> &TabularDataset {
        &self.dataset
    }

    /// Resolved hyperparameters used for training.
    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    pub fn fitted_estimator(&self) -> &FittedEstimator {
        &self.fitted
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let artifact = PipeArtifact {
            dataset: self.dataset.clone(),
            estimator: self.estimator.clone(),
            preprocessor: self.preprocessor.extract_params(),
            fitted: self.fitted.extract_params(),
        };
        let bytes = artifact
            .to_bytes()
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, bytes).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), model = %self.kind(), "fitted pipe saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::NotFound(path.to_path_buf())
            } else {
                ArtifactError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let artifact = PipeArtifact::from_bytes(&bytes)
            .map_err(|e| ArtifactError::Serialization(format!("{}: {e}", path.display())))?;
        Ok(Self {
            dataset: artifact.dataset,
            estimator: artifact.estimator,
            preprocessor: FittedPreprocessor::from_params(artifact.preprocessor)?,
            fitted: FittedEstimator::from_params(artifact.fitted)?,
        })
    }

    /// Predictions for the held-out rows, in `test_index` order.
    pub fn predict(&self) -> Result<Array1<f64>> {
        let x_test = self.preprocessor.transform(&self.dataset.split().x_test)?;
        Ok(self.fitted.predict(&x_test)?)
    }

    /// Writes `<dir>/<ts>_<MODEL>_predictions.xlsx` with columns
    /// `(index, prediction)`.
    pub fn save_predictions(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let predictions = self.predict()?;
        let path = dir.as_ref().join(format!(
            "{}_{}_predictions.xlsx",
            timestamp(),
            self.kind().name()
        ));

        let mut sheet = Sheet::new("predictions", vec!["index".into(), "prediction".into()]);
        for (&row, &value) in self.dataset.split().test_index.iter().zip(predictions.iter()) {
            sheet.rows.push(vec![Cell::Number(row as f64), Cell::Number(value)]);
        }
        write_workbook(&path, &[sheet])?;
        info!(path = %path.display(), rows = predictions.len(), "predictions saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Table};

    fn dataset() -> TabularDataset {
        let n = 20;
        let a: Vec<Option<f64>> = (0..n).map(|i| Some(i as f64)).collect();
        let kind: Vec<Option<String>> = (0..n)
            .map(|i| Some(if i % 2 == 0 { "even" } else { "odd" }.to_string()))
            .collect();
        let target: Vec<Option<f64>> = (0..n)
            .map(|i| Some(2.0 * i as f64 + if i % 2 == 0 { 0.0 } else { 5.0 }))
            .collect();
        let table = Table::from_columns([
            ("a", Column::Numeric(a)),
            ("parity", Column::Text(kind)),
            ("edu_index", Column::Numeric(target)),
        ])
        .unwrap();
        TabularDataset::new(&table, "data", "edu_index", 0.25, None, Some(11)).unwrap()
    }

    #[test]
    fn test_fit_writes_named_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let (fitted, path) = Pipe::new(dataset(), ModelKind::LinearRegression)
            .fit(None, dir.path())
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_LINEAR_REGRESSION_model.bin"));
        assert!(path.exists());
        assert_eq!(fitted.kind(), ModelKind::LinearRegression);
        // parity one-hot (2) + scaled a (1)
        assert_eq!(fitted.preprocessor().n_features_out(), 3);
    }

    #[test]
    fn test_predictions_are_accurate() {
        let dir = tempfile::tempdir().unwrap();
        let params = Hyperparameters {
            max_iter: Some(5000),
            ..Default::default()
        };
        let (fitted, _) = Pipe::new(dataset(), ModelKind::LinearRegression)
            .fit(Some(&params), dir.path())
            .unwrap();
        let pred = fitted.predict().unwrap();
        let y_test = &fitted.dataset().split().y_test;
        assert_eq!(pred.len(), y_test.len());
        for (p, t) in pred.iter().zip(y_test) {
            assert!((p - t).abs() < 0.1, "{p} vs {t}");
        }
    }

    #[test]
    fn test_load_reproduces_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let (fitted, path) = Pipe::new(dataset(), ModelKind::RidgeRegression)
            .fit(None, dir.path())
            .unwrap();
        let loaded = FittedPipe::load(&path).unwrap();
        assert_eq!(loaded.kind(), ModelKind::RidgeRegression);
        assert_eq!(loaded.estimator(), fitted.estimator());
        assert_eq!(loaded.predict().unwrap(), fitted.predict().unwrap());
    }

    #[test]
    fn test_save_predictions_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (fitted, _) = Pipe::new(dataset(), ModelKind::LassoRegression)
            .fit(None, dir.path())
            .unwrap();
        let out = fitted.save_predictions(dir.path().join("pred")).unwrap();
        assert!(out
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_LASSO_REGRESSION_predictions.xlsx"));

        let grid = crate::spreadsheet::read_sheet(&out, "predictions").unwrap();
        assert_eq!(grid[0][0].as_text().as_deref(), Some("index"));
        assert_eq!(grid[0][1].as_text().as_deref(), Some("prediction"));
        assert_eq!(grid.len(), 1 + fitted.dataset().split().test_index.len());
        assert_eq!(
            grid[1][0].as_number(),
            Some(fitted.dataset().split().test_index[0] as f64)
        );
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = FittedPipe::load(dir.path().join("nope_model.bin")).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Artifact(ArtifactError::NotFound(_))
        ));
    }
}
