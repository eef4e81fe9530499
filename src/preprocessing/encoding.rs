//! One-hot encoding for categorical features.
//!
//! Each input column is a categorical feature with string values. The encoder
//! learns the sorted set of categories per column and emits one indicator
//! column per category, blocks in input column order.
//!
//! ```text
//! [["a"], ["b"], ["a"]]  ->  [[1, 0], [0, 1], [1, 0]]
//! ```

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Strategy for handling categories not seen during fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum HandleUnknown {
    /// Return an error.
    #[default]
    Error,
    /// Encode as all zeros for that feature's block.
    Ignore,
}

#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }
}

/// Serializable parameters for a fitted OneHotEncoder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OneHotEncoderParams {
    /// Sorted categories for each input column.
    pub categories: Vec<Vec<String>>,
    pub handle_unknown: HandleUnknown,
}

#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    categories: Vec<Vec<String>>,
    offsets: Vec<usize>,
    n_features_out: usize,
    handle_unknown: HandleUnknown,
}

impl FittedOneHotEncoder {
    fn build(categories: Vec<Vec<String>>, handle_unknown: HandleUnknown) -> Self {
        let mut offsets = Vec::with_capacity(categories.len());
        let mut total = 0;
        for cats in &categories {
            offsets.push(total);
            total += cats.len();
        }
        Self {
            categories,
            offsets,
            n_features_out: total,
            handle_unknown,
        }
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    pub fn n_features_out(&self) -> usize {
        self.n_features_out
    }

    /// Output column names as `<feature>_<category>`.
    pub fn feature_names_out<S: AsRef<str>>(&self, input_names: &[S]) -> Vec<String> {
        input_names
            .iter()
            .zip(&self.categories)
            .flat_map(|(name, cats)| {
                cats.iter()
                    .map(move |cat| format!("{}_{}", name.as_ref(), cat))
            })
            .collect()
    }
}

impl Transformer for OneHotEncoder {
    type Input = Array2<String>;
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;
    type Fitted = FittedOneHotEncoder;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }
        let categories = data
            .axis_iter(Axis(1))
            .map(|col| {
                col.iter()
                    .cloned()
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect()
            })
            .collect();
        Ok(FittedOneHotEncoder::build(categories, self.handle_unknown))
    }
}

impl FittedTransformer for FittedOneHotEncoder {
    type Input = Array2<String>;
    type Output = Array2<f64>;
    type Params = OneHotEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.ncols() != self.categories.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.categories.len(),
                got_features: data.ncols(),
            });
        }

        let mut out = Array2::<f64>::zeros((data.nrows(), self.n_features_out));
        for ((row, col), value) in data.indexed_iter() {
            match self.categories[col].binary_search(value) {
                Ok(idx) => out[[row, self.offsets[col] + idx]] = 1.0,
                Err(_) if self.handle_unknown == HandleUnknown::Ignore => {}
                Err(_) => {
                    return Err(PreprocessingError::InvalidParameter(format!(
                        "Unknown category '{}' in column {}",
                        value, col
                    )))
                }
            }
        }
        Ok(out)
    }

    fn extract_params(&self) -> Self::Params {
        OneHotEncoderParams {
            categories: self.categories.clone(),
            handle_unknown: self.handle_unknown,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        for (col, cats) in params.categories.iter().enumerate() {
            if cats.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "categories of column {} are not sorted and unique",
                    col
                )));
            }
        }
        Ok(Self::build(params.categories, params.handle_unknown))
    }

    fn n_features_in(&self) -> usize {
        self.categories.len()
    }
}
