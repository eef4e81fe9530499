//! Tabular preprocessing: missing-value handling followed by a column transform.
//!
//! Fitting learns, from the raw training table only:
//! - which columns are numeric and which are categorical;
//! - one fill value per numeric column ([`ImputeStrategy`], mean by default);
//! - the mostly-missing columns, whose missing fraction is strictly greater
//!   than the threshold (0.5 by default);
//! - a [`ColumnTransformer`] with one-hot encoding for categorical columns
//!   followed by standard scaling for numeric columns.
//!
//! Every table, training or new, goes through the same preparation before the
//! column transform: mostly-missing columns are replaced in place by a
//! presence indicator (1 missing, 0 present), remaining numeric gaps get the
//! fill value and remaining categorical gaps get [`CATEGORICAL_SENTINEL`].
//! The output columns are all one-hot blocks, then all scaled numeric columns.

use crate::preprocessing::column_transformer::{
    numeric_matrix, ColumnStep, ColumnTransformer, ColumnTransformerParams,
    FittedColumnTransformer,
};
use crate::preprocessing::encoding::{HandleUnknown, OneHotEncoder};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::imputation::{
    FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams,
};
use crate::preprocessing::scaling::StandardScaler;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::table::{Column, ColumnKind, Table};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default missing fraction above which a column is binarized.
pub const MOSTLY_MISSING_THRESHOLD: f64 = 0.5;

/// Fill token for missing categorical cells.
pub const CATEGORICAL_SENTINEL: &str = "-1";

#[derive(Clone, Debug)]
pub struct Preprocessor {
    strategy: ImputeStrategy,
    threshold: f64,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            strategy: ImputeStrategy::Mean,
            threshold: MOSTLY_MISSING_THRESHOLD,
        }
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate used for numeric fill values.
    pub fn with_strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Transformer for Preprocessor {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = PreprocessorParams;
    type Fitted = FittedPreprocessor;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit Preprocessor on empty table".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "missing threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        let mut mostly_missing = Vec::new();
        for (name, column) in data.columns() {
            match column.kind() {
                ColumnKind::Numeric => numeric.push(name.to_string()),
                ColumnKind::Categorical => categorical.push(name.to_string()),
            }
            if column.missing_fraction() > self.threshold {
                mostly_missing.push(name.to_string());
            }
        }

        let imputer = SimpleImputer::new(self.strategy.clone()).fit(&numeric_matrix(data, &numeric)?)?;

        let mut fitted = FittedPreprocessor {
            numeric,
            categorical,
            mostly_missing,
            imputer,
            columns: None,
        };

        let prepared = fitted.prepare(data)?;
        let columns = ColumnTransformer::new()
            .add(
                "categorical",
                ColumnStep::OneHotEncoder(
                    OneHotEncoder::new().with_handle_unknown(HandleUnknown::Ignore),
                ),
                &fitted.categorical,
            )
            .add(
                "numeric",
                ColumnStep::StandardScaler(StandardScaler::new()),
                &fitted.numeric,
            )
            .fit(&prepared)?;

        debug!(
            numeric = fitted.numeric.len(),
            categorical = fitted.categorical.len(),
            mostly_missing = fitted.mostly_missing.len(),
            outputs = columns.n_features_out(),
            "fitted preprocessor"
        );
        fitted.columns = Some(columns);
        Ok(fitted)
    }
}

/// Serializable parameters for a fitted Preprocessor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessorParams {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub mostly_missing: Vec<String>,
    pub imputer: SimpleImputerParams,
    pub columns: ColumnTransformerParams,
}

/// Fitted preprocessing state.
#[derive(Clone, Debug)]
pub struct FittedPreprocessor {
    numeric: Vec<String>,
    categorical: Vec<String>,
    mostly_missing: Vec<String>,
    imputer: FittedSimpleImputer,
    // Only `None` while `fit` is still building the column transform.
    columns: Option<FittedColumnTransformer>,
}

impl FittedPreprocessor {
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical
    }

    /// Columns replaced by a missing-value indicator.
    pub fn mostly_missing_columns(&self) -> &[String] {
        &self.mostly_missing
    }

    /// Fill value learned for each numeric column, in column order.
    pub fn fill_values(&self) -> Vec<(&str, f64)> {
        self.numeric
            .iter()
            .map(String::as_str)
            .zip(self.imputer.statistics().iter().copied())
            .collect()
    }

    fn is_mostly_missing(&self, name: &str) -> bool {
        self.mostly_missing.iter().any(|c| c == name)
    }

    /// Applies binarization and imputation, returning a gap-free table with
    /// the categorical columns followed by the numeric ones.
    pub fn prepare(&self, data: &Table) -> Result<Table, PreprocessingError> {
        let mut raw_numeric = numeric_matrix(data, &self.numeric)?;
        for (j, name) in self.numeric.iter().enumerate() {
            if self.is_mostly_missing(name) {
                raw_numeric
                    .column_mut(j)
                    .mapv_inplace(|v| if v.is_nan() { 1.0 } else { 0.0 });
            }
        }
        let filled = self.imputer.transform(&raw_numeric)?;

        let mut prepared = Table::new();
        for name in &self.categorical {
            let column = data
                .column(name)
                .map_err(|_| PreprocessingError::UnknownColumn(name.clone()))?;
            let values: Vec<Option<String>> = if self.is_mostly_missing(name) {
                (0..column.len())
                    .map(|row| Some(if column.is_missing(row) { "1" } else { "0" }.to_string()))
                    .collect()
            } else {
                column
                    .to_text()
                    .into_iter()
                    .map(|v| Some(v.unwrap_or_else(|| CATEGORICAL_SENTINEL.to_string())))
                    .collect()
            };
            prepared.push_column(name.clone(), Column::Text(values))?;
        }
        for (j, name) in self.numeric.iter().enumerate() {
            let values = filled.column(j).iter().map(|&v| Some(v)).collect();
            prepared.push_column(name.clone(), Column::Numeric(values))?;
        }
        Ok(prepared)
    }

    fn column_transform(&self) -> Result<&FittedColumnTransformer, PreprocessingError> {
        self.columns.as_ref().ok_or_else(|| {
            PreprocessingError::InvalidParameter("column transform not fitted".to_string())
        })
    }

    /// Number of output columns.
    pub fn n_features_out(&self) -> usize {
        self.columns
            .as_ref()
            .map_or(0, FittedColumnTransformer::n_features_out)
    }
}

impl FittedTransformer for FittedPreprocessor {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = PreprocessorParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let prepared = self.prepare(data)?;
        self.column_transform()?.transform(&prepared)
    }

    fn extract_params(&self) -> Self::Params {
        PreprocessorParams {
            numeric: self.numeric.clone(),
            categorical: self.categorical.clone(),
            mostly_missing: self.mostly_missing.clone(),
            imputer: self.imputer.extract_params(),
            columns: self
                .columns
                .as_ref()
                .map(FittedTransformer::extract_params)
                .unwrap_or(ColumnTransformerParams { steps: Vec::new() }),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let imputer = FittedSimpleImputer::from_params(params.imputer)?;
        if imputer.n_features_in() != params.numeric.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: params.numeric.len(),
                got_features: imputer.n_features_in(),
            });
        }
        Ok(Self {
            numeric: params.numeric,
            categorical: params.categorical,
            mostly_missing: params.mostly_missing,
            imputer,
            columns: Some(FittedColumnTransformer::from_params(params.columns)?),
        })
    }

    fn n_features_in(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }
}
