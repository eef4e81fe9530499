//! On-disk artifacts: fitted models, hyperparameter documents, predictions.

use crate::config::Settings;
use crate::estimator::Hyperparameters;
use crate::registry::ModelKind;
use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} not found")]
    NotFound(PathBuf),
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound(path.to_path_buf())
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Local-time prefix shared by every artifact name: `2024.3.7_9-5-2`.
pub fn timestamp() -> String {
    Local::now().format("%Y.%-m.%-d_%-H-%-M-%-S").to_string()
}

/// Directories holding estimated models, hyperparameter files and predictions.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    models_dir: PathBuf,
    params_dir: PathBuf,
    predictions_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        params_dir: impl Into<PathBuf>,
        predictions_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            models_dir: models_dir.into(),
            params_dir: params_dir.into(),
            predictions_dir: predictions_dir.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.estimated_models_path,
            &settings.model_parameters_path,
            &settings.prediction_path,
        )
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn params_dir(&self) -> &Path {
        &self.params_dir
    }

    pub fn predictions_dir(&self) -> &Path {
        &self.predictions_dir
    }

    pub fn ensure_dirs(&self) -> Result<(), ArtifactError> {
        for dir in [&self.models_dir, &self.params_dir, &self.predictions_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ArtifactError::io(dir, e))?;
        }
        Ok(())
    }

    /// File names in the models directory, sorted. A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<String>, ArtifactError> {
        let entries = match std::fs::read_dir(&self.models_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArtifactError::io(&self.models_dir, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(&self.models_dir, e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Path of a model artifact; `name` must be a bare file name.
    pub fn model_path(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
        {
            return Err(ArtifactError::InvalidName(name.to_string()));
        }
        Ok(self.models_dir.join(name))
    }

    pub fn delete(&self, name: &str) -> Result<(), ArtifactError> {
        let path = self.model_path(name)?;
        if !path.is_file() {
            return Err(ArtifactError::NotFound(path));
        }
        std::fs::remove_file(&path).map_err(|e| ArtifactError::io(&path, e))?;
        info!(artifact = %name, "deleted estimated model");
        Ok(())
    }

    pub fn params_path(&self, kind: ModelKind) -> PathBuf {
        self.params_dir.join(kind.params_file_name())
    }

    /// Raw hyperparameter document of `kind`.
    pub fn read_params(&self, kind: ModelKind) -> Result<Value, ArtifactError> {
        let path = self.params_path(kind);
        let text = std::fs::read_to_string(&path).map_err(|e| ArtifactError::io(&path, e))?;
        serde_json::from_str(&text).map_err(|source| ArtifactError::Json { path, source })
    }

    /// Hyperparameters of `kind`, or `None` when no document exists.
    pub fn load_hyperparameters(
        &self,
        kind: ModelKind,
    ) -> Result<Option<Hyperparameters>, ArtifactError> {
        let path = self.params_path(kind);
        let value = match self.read_params(kind) {
            Ok(value) => value,
            Err(ArtifactError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| ArtifactError::Json { path, source })
    }

    /// Replaces the document of `kind` with `params`, pretty-printed with
    /// four-space indentation.
    pub fn write_params(
        &self,
        kind: ModelKind,
        params: &Map<String, Value>,
    ) -> Result<PathBuf, ArtifactError> {
        std::fs::create_dir_all(&self.params_dir)
            .map_err(|e| ArtifactError::io(&self.params_dir, e))?;
        let path = self.params_path(kind);

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        params
            .serialize(&mut ser)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        std::fs::write(&path, buf).map_err(|e| ArtifactError::io(&path, e))?;
        debug!(path = %path.display(), "hyperparameters written");
        Ok(path)
    }
}
