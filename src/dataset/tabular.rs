//! Named tabular dataset with a randomized, optionally persisted train/test split.

use crate::artifacts::timestamp;
use crate::spreadsheet::{write_workbook, Sheet, SpreadsheetError};
use crate::table::{Column, ColumnKind, Table, TableError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("target column '{0}' not found")]
    MissingTarget(String),
    #[error("target column '{0}' is not numeric")]
    NonNumericTarget(String),
    #[error("target column '{name}' has {count} missing values")]
    TargetHasMissing { name: String, count: usize },
    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),
    #[error("dataset '{name}' has {rows} rows, at least 2 are needed to split")]
    TooSmall { name: String, rows: usize },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
}

/// Train/test partition. Row indices refer to the source table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub x_train: Table,
    pub y_train: Vec<f64>,
    pub x_test: Table,
    pub y_test: Vec<f64>,
    pub train_index: Vec<usize>,
    pub test_index: Vec<usize>,
}

/// A table bound to a target column, split once at construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TabularDataset {
    name: String,
    target: String,
    features: Vec<String>,
    test_size: f64,
    n_rows: usize,
    split: Split,
    split_files: Option<(PathBuf, PathBuf)>,
}

impl TabularDataset {
    /// Binds `data` to `target` and splits it.
    ///
    /// The test part holds `ceil(test_size * n)` rows, clamped so both parts
    /// are non-empty. With `storage` set, the split is written to
    /// `<ts>_train_<name>.xlsx` and `<ts>_test_<name>.xlsx` in that directory.
    /// `seed` makes the shuffle reproducible.
    pub fn new(
        data: &Table,
        name: &str,
        target: &str,
        test_size: f64,
        storage: Option<&Path>,
        seed: Option<u64>,
    ) -> Result<Self, DatasetError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DatasetError::InvalidTestSize(test_size));
        }
        let target_column = data
            .column(target)
            .map_err(|_| DatasetError::MissingTarget(target.to_string()))?;
        if target_column.kind() != ColumnKind::Numeric {
            return Err(DatasetError::NonNumericTarget(target.to_string()));
        }
        let missing = target_column.missing_count();
        if missing > 0 {
            return Err(DatasetError::TargetHasMissing {
                name: target.to_string(),
                count: missing,
            });
        }

        let n = data.n_rows();
        if n < 2 {
            return Err(DatasetError::TooSmall {
                name: name.to_string(),
                rows: n,
            });
        }

        let features: Vec<String> = data
            .names()
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect();
        let x = data.select(&features)?;
        let y = target_column.to_f64();

        let n_test = ((test_size * n as f64) - 1e-9).ceil().clamp(1.0, (n - 1) as f64) as usize;
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        order.shuffle(&mut rng);
        let test_index = order[..n_test].to_vec();
        let train_index = order[n_test..].to_vec();

        let split = Split {
            x_train: x.take_rows(&train_index)?,
            y_train: train_index.iter().map(|&i| y[i]).collect(),
            x_test: x.take_rows(&test_index)?,
            y_test: test_index.iter().map(|&i| y[i]).collect(),
            train_index,
            test_index,
        };

        let mut dataset = Self {
            name: name.to_string(),
            target: target.to_string(),
            features,
            test_size,
            n_rows: n,
            split,
            split_files: None,
        };
        if let Some(dir) = storage {
            dataset.split_files = Some(dataset.persist_split(dir)?);
        }
        info!(
            dataset = %dataset.name,
            train = dataset.split.train_index.len(),
            test = dataset.split.test_index.len(),
            "split dataset"
        );
        Ok(dataset)
    }

    fn persist_split(&self, dir: &Path) -> Result<(PathBuf, PathBuf), DatasetError> {
        let ts = timestamp();
        let train_path = dir.join(format!("{ts}_train_{}.xlsx", self.name));
        let test_path = dir.join(format!("{ts}_test_{}.xlsx", self.name));

        for (path, sheet_name, x, y, index) in [
            (&train_path, "train", &self.split.x_train, &self.split.y_train, &self.split.train_index),
            (&test_path, "test", &self.split.x_test, &self.split.y_test, &self.split.test_index),
        ] {
            let mut with_target = x.clone();
            with_target.push_column(
                self.target.clone(),
                Column::Numeric(y.iter().map(|&v| Some(v)).collect()),
            )?;
            write_workbook(path, &[Sheet::from_table(sheet_name, &with_target, Some(index))])?;
        }
        Ok((train_path, test_path))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn test_size(&self) -> f64 {
        self.test_size
    }

    /// Row count of the source table.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn split(&self) -> &Split {
        &self.split
    }

    /// Paths of the persisted train and test files, if written.
    pub fn split_files(&self) -> Option<(&Path, &Path)> {
        self.split_files
            .as_ref()
            .map(|(train, test)| (train.as_path(), test.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ten_rows() -> Table {
        let ids = (1..=10).map(|i| Some(i as f64)).collect();
        let edu = (1..=10).map(|i| Some(i as f64 * 0.1)).collect();
        let sci = (1..=10).map(|i| Some(100.0 - i as f64)).collect();
        Table::from_columns([
            ("id", Column::Numeric(ids)),
            ("edu_index", Column::Numeric(edu)),
            ("science_index", Column::Numeric(sci)),
        ])
        .unwrap()
    }

    #[test]
    fn test_features_exclude_target() {
        let ds = TabularDataset::new(&ten_rows(), "data", "edu_index", 0.3, None, Some(1)).unwrap();
        assert_eq!(ds.features(), &["id", "science_index"]);
        assert_eq!(ds.split().x_train.names(), ds.features());
    }

    #[test]
    fn test_split_sizes() {
        let ds = TabularDataset::new(&ten_rows(), "data", "edu_index", 0.3, None, Some(7)).unwrap();
        let split = ds.split();
        assert_eq!(split.x_train.n_rows(), 7);
        assert_eq!(split.x_test.n_rows(), 3);
        assert_eq!(split.y_train.len(), 7);
        assert_eq!(split.y_test.len(), 3);

        let all: HashSet<usize> = split
            .train_index
            .iter()
            .chain(&split.test_index)
            .copied()
            .collect();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_targets_follow_rows() {
        let ds = TabularDataset::new(&ten_rows(), "data", "edu_index", 0.3, None, Some(3)).unwrap();
        let split = ds.split();
        for (pos, &row) in split.test_index.iter().enumerate() {
            assert!((split.y_test[pos] - (row as f64 + 1.0) * 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = TabularDataset::new(&ten_rows(), "data", "edu_index", 0.3, None, Some(42)).unwrap();
        let b = TabularDataset::new(&ten_rows(), "data", "edu_index", 0.3, None, Some(42)).unwrap();
        assert_eq!(a.split(), b.split());
    }

    #[test]
    fn test_missing_target_rejected() {
        let err = TabularDataset::new(&ten_rows(), "data", "nope", 0.3, None, None).unwrap_err();
        assert!(matches!(err, DatasetError::MissingTarget(_)));
    }

    #[test]
    fn test_invalid_test_size_rejected() {
        let err = TabularDataset::new(&ten_rows(), "data", "edu_index", 1.0, None, None).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidTestSize(_)));
    }

    #[test]
    fn test_split_persisted_with_timestamped_names() {
        let dir = tempfile::tempdir().unwrap();
        let ds = TabularDataset::new(&ten_rows(), "data", "edu_index", 0.3, Some(dir.path()), Some(5))
            .unwrap();
        let (train, test) = ds.split_files().unwrap();
        assert!(train.exists() && test.exists());
        let train_name = train.file_name().unwrap().to_string_lossy().to_string();
        assert!(train_name.ends_with("_train_data.xlsx"));
        assert!(test
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_test_data.xlsx"));

        let grid = crate::spreadsheet::read_sheet(train, "train").unwrap();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid[0].len(), 4);
    }
}
