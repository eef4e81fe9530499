//! ColumnTransformer implementation.
//!
//! Applies different transformers to named column subsets of a [`Table`] and
//! concatenates their outputs horizontally, in step order.

use crate::preprocessing::encoding::{FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::table::Table;
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Unfitted transformers usable inside a ColumnTransformer.
#[derive(Clone, Debug)]
pub enum ColumnStep {
    OneHotEncoder(OneHotEncoder),
    StandardScaler(StandardScaler),
}

#[derive(Clone, Debug)]
pub enum FittedColumnStep {
    OneHotEncoder(FittedOneHotEncoder),
    StandardScaler(FittedStandardScaler),
}

impl FittedColumnStep {
    fn transform(&self, table: &Table, columns: &[String]) -> Result<Array2<f64>, PreprocessingError> {
        match self {
            FittedColumnStep::OneHotEncoder(t) => t.transform(&text_matrix(table, columns)?),
            FittedColumnStep::StandardScaler(t) => t.transform(&numeric_matrix(table, columns)?),
        }
    }

    fn step_name(&self) -> &'static str {
        match self {
            FittedColumnStep::OneHotEncoder(_) => "OneHotEncoder",
            FittedColumnStep::StandardScaler(_) => "StandardScaler",
        }
    }

    fn n_features_out(&self) -> usize {
        match self {
            FittedColumnStep::OneHotEncoder(t) => t.n_features_out(),
            FittedColumnStep::StandardScaler(t) => t.n_features_in(),
        }
    }
}

/// Serializable form of one fitted step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ColumnStepParams {
    OneHotEncoder(OneHotEncoderParams),
    StandardScaler(StandardScalerParams),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnTransformerParams {
    pub steps: Vec<(String, ColumnStepParams, Vec<String>)>,
}

/// ColumnTransformer (unfitted).
///
/// ```ignore
/// let ct = ColumnTransformer::new()
///     .add("categorical", ColumnStep::OneHotEncoder(OneHotEncoder::new()), &["region"])
///     .add("numeric", ColumnStep::StandardScaler(StandardScaler::new()), &["wage", "income"]);
/// let fitted = ct.fit(&table)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnTransformer {
    steps: Vec<(String, ColumnStep, Vec<String>)>,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step. Steps with no columns are skipped at fit time.
    pub fn add<S: AsRef<str>>(mut self, name: &str, step: ColumnStep, columns: &[S]) -> Self {
        let columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self.steps.push((name.to_string(), step, columns));
        self
    }
}

impl Transformer for ColumnTransformer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = ColumnTransformerParams;
    type Fitted = FittedColumnTransformer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.n_rows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit ColumnTransformer on empty data".to_string(),
            ));
        }

        let mut fitted = Vec::with_capacity(self.steps.len());
        for (name, step, columns) in &self.steps {
            if columns.is_empty() {
                continue;
            }
            let fitted_step = match step {
                ColumnStep::OneHotEncoder(t) => {
                    FittedColumnStep::OneHotEncoder(t.fit(&text_matrix(data, columns)?)?)
                }
                ColumnStep::StandardScaler(t) => {
                    FittedColumnStep::StandardScaler(t.fit(&numeric_matrix(data, columns)?)?)
                }
            };
            tracing::debug!(
                step = %name,
                kind = fitted_step.step_name(),
                inputs = columns.len(),
                outputs = fitted_step.n_features_out(),
                "fitted column step"
            );
            fitted.push((name.clone(), fitted_step, columns.clone()));
        }

        Ok(FittedColumnTransformer { steps: fitted })
    }
}

/// Fitted ColumnTransformer.
#[derive(Clone, Debug)]
pub struct FittedColumnTransformer {
    steps: Vec<(String, FittedColumnStep, Vec<String>)>,
}

impl FittedColumnTransformer {
    /// Total number of output columns.
    pub fn n_features_out(&self) -> usize {
        self.steps.iter().map(|(_, s, _)| s.n_features_out()).sum()
    }

    /// Names of the fitted steps, in output order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _, _)| name.as_str()).collect()
    }
}

impl FittedTransformer for FittedColumnTransformer {
    type Input = Table;
    type Output = Array2<f64>;
    type Params = ColumnTransformerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let blocks = self
            .steps
            .iter()
            .map(|(_, step, columns)| step.transform(data, columns))
            .collect::<Result<Vec<_>, _>>()?;

        if blocks.is_empty() {
            return Ok(Array2::zeros((data.n_rows(), 0)));
        }
        let views: Vec<ArrayView2<'_, f64>> = blocks.iter().map(|b| b.view()).collect();
        concatenate(Axis(1), &views).map_err(|e| PreprocessingError::InvalidShape {
            expected: "blocks with equal row counts".to_string(),
            got: e.to_string(),
        })
    }

    fn extract_params(&self) -> Self::Params {
        let steps = self
            .steps
            .iter()
            .map(|(name, step, columns)| {
                let params = match step {
                    FittedColumnStep::OneHotEncoder(t) => {
                        ColumnStepParams::OneHotEncoder(t.extract_params())
                    }
                    FittedColumnStep::StandardScaler(t) => {
                        ColumnStepParams::StandardScaler(t.extract_params())
                    }
                };
                (name.clone(), params, columns.clone())
            })
            .collect();
        ColumnTransformerParams { steps }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let steps = params
            .steps
            .into_iter()
            .map(|(name, step, columns)| {
                let fitted = match step {
                    ColumnStepParams::OneHotEncoder(p) => {
                        FittedColumnStep::OneHotEncoder(FittedOneHotEncoder::from_params(p)?)
                    }
                    ColumnStepParams::StandardScaler(p) => {
                        FittedColumnStep::StandardScaler(FittedStandardScaler::from_params(p)?)
                    }
                };
                Ok((name, fitted, columns))
            })
            .collect::<Result<Vec<_>, PreprocessingError>>()?;
        Ok(Self { steps })
    }

    fn n_features_in(&self) -> usize {
        self.steps.iter().map(|(_, _, columns)| columns.len()).sum()
    }
}

/// `f64` matrix of the named columns; missing cells become `NaN`.
pub fn numeric_matrix<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Array2<f64>, PreprocessingError> {
    let mut out = Array2::<f64>::zeros((table.n_rows(), columns.len()));
    for (j, name) in columns.iter().enumerate() {
        let name = name.as_ref();
        let values = table
            .column(name)
            .map_err(|_| PreprocessingError::UnknownColumn(name.to_string()))?
            .to_f64();
        out.column_mut(j).assign(&ndarray::Array1::from(values));
    }
    Ok(out)
}

/// String matrix of the named columns; a missing cell is an error.
pub fn text_matrix<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Array2<String>, PreprocessingError> {
    let mut out = Array2::<String>::default((table.n_rows(), columns.len()));
    for (j, name) in columns.iter().enumerate() {
        let name = name.as_ref();
        let values = table
            .column(name)
            .map_err(|_| PreprocessingError::UnknownColumn(name.to_string()))?
            .to_text();
        for (i, value) in values.into_iter().enumerate() {
            out[[i, j]] = value.ok_or_else(|| {
                PreprocessingError::MissingValues(format!("column '{}' row {}", name, i))
            })?;
        }
    }
    Ok(out)
}
