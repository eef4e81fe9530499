//! Simple Imputer.
//!
//! Learns one fill value per column and replaces missing cells (`NaN`) with it.
//! Supports mean, median, most-frequent and constant strategies.

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strategy for computing fill values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Mean of the present values.
    #[default]
    Mean,
    /// Median of the present values.
    Median,
    /// Most frequent present value; ties resolve to the smallest value.
    MostFrequent,
    /// A fixed value for every column.
    Constant(f64),
}

impl ImputeStrategy {
    /// Aggregates one column, ignoring `NaN`. An all-missing column yields `0.0`.
    pub fn aggregate(&self, column: ArrayView1<'_, f64>) -> f64 {
        if let ImputeStrategy::Constant(value) = self {
            return *value;
        }
        let mut present: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            return 0.0;
        }
        match self {
            ImputeStrategy::Mean => present.iter().sum::<f64>() / present.len() as f64,
            ImputeStrategy::Median => {
                present.sort_by(f64::total_cmp);
                let n = present.len();
                if n % 2 == 0 {
                    (present[n / 2 - 1] + present[n / 2]) / 2.0
                } else {
                    present[n / 2]
                }
            }
            ImputeStrategy::MostFrequent => {
                let mut counts: HashMap<u64, usize> = HashMap::new();
                for v in &present {
                    *counts.entry(v.to_bits()).or_insert(0) += 1;
                }
                counts
                    .into_iter()
                    .map(|(bits, count)| (f64::from_bits(bits), count))
                    .max_by(|a, b| a.1.cmp(&b.1).then(b.0.total_cmp(&a.0)))
                    .map_or(0.0, |(value, _)| value)
            }
            ImputeStrategy::Constant(value) => *value,
        }
    }
}

/// Serializable parameters for a fitted SimpleImputer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleImputerParams {
    pub strategy: ImputeStrategy,
    /// Fill value for each feature.
    pub statistics: Vec<f64>,
}

/// SimpleImputer transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }
}

impl Transformer for SimpleImputer {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = SimpleImputerParams;
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit SimpleImputer on empty data".to_string(),
            ));
        }
        let statistics: Array1<f64> = data
            .axis_iter(Axis(1))
            .map(|col| self.strategy.aggregate(col))
            .collect();

        Ok(FittedSimpleImputer {
            strategy: self.strategy.clone(),
            statistics,
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    statistics: Array1<f64>,
}

impl FittedSimpleImputer {
    /// Fill values for each feature.
    pub fn statistics(&self) -> &Array1<f64> {
        &self.statistics
    }
}

impl FittedTransformer for FittedSimpleImputer {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = SimpleImputerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        if data.ncols() != self.statistics.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.statistics.len(),
                got_features: data.ncols(),
            });
        }

        let mut out = data.clone();
        for (mut col, &fill) in out.axis_iter_mut(Axis(1)).zip(self.statistics.iter()) {
            col.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(out)
    }

    fn extract_params(&self) -> Self::Params {
        SimpleImputerParams {
            strategy: self.strategy.clone(),
            statistics: self.statistics.to_vec(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        Ok(Self {
            strategy: params.strategy,
            statistics: Array1::from(params.statistics),
        })
    }

    fn n_features_in(&self) -> usize {
        self.statistics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use crate::serialization::SerializableParams;

    fn data_with_missing() -> Array2<f64> {
        array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 6.0]]
    }

    #[test]
    fn test_simple_imputer_mean() {
        let data = data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        assert_eq!(fitted.statistics().to_vec(), vec![3.0, 5.0]);

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed, array![[1.0, 5.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_simple_imputer_median() {
        let data = array![[1.0], [f64::NAN], [10.0], [2.0]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
        assert_eq!(fitted.statistics()[0], 2.0);
    }

    #[test]
    fn test_simple_imputer_most_frequent() {
        let data = array![[1.0, f64::NAN], [1.0, 2.0], [3.0, 2.0], [3.0, 7.0]];
        let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent)
            .fit(&data)
            .unwrap();
        // 1 and 3 tie in the first column; the smaller wins.
        assert_eq!(fitted.statistics().to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_simple_imputer_constant() {
        let data = data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Constant(-1.0))
            .fit(&data)
            .unwrap();
        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed[[0, 1]], -1.0);
    }

    #[test]
    fn test_all_missing_column_fills_zero() {
        let data = array![[f64::NAN, 1.0], [f64::NAN, 2.0]];
        let fitted = SimpleImputer::default().fit(&data).unwrap();
        assert_eq!(fitted.statistics().to_vec(), vec![0.0, 1.5]);
    }

    #[test]
    fn test_simple_imputer_feature_mismatch() {
        let fitted = SimpleImputer::default().fit(&data_with_missing()).unwrap();
        let result = fitted.transform(&array![[1.0, 2.0, 3.0]]);
        assert!(matches!(
            result,
            Err(PreprocessingError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        ));
    }

    #[test]
    fn test_simple_imputer_empty_data() {
        let data = Array2::<f64>::zeros((0, 2));
        assert!(SimpleImputer::default().fit(&data).is_err());
    }

    #[test]
    fn test_simple_imputer_params_bytes() {
        let data = data_with_missing();
        let fitted = SimpleImputer::default().fit(&data).unwrap();

        let bytes = fitted.extract_params().to_bytes().unwrap();
        let params = SimpleImputerParams::from_bytes(&bytes).unwrap();
        let loaded = FittedSimpleImputer::from_params(params).unwrap();

        assert_eq!(loaded.n_features_in(), 2);
        assert_eq!(
            loaded.transform(&data).unwrap(),
            fitted.transform(&data).unwrap()
        );
    }
}
