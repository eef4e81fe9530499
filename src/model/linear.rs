//! Linear model with compile-time state tracking.
//!
//! - [`LinearRegression`] = `LinearModel<Unfitted>`, used during training.
//! - `LinearModel<Fitted>`, inference-only and serializable.
//!
//! The penalty (none, L1, L2) lives in the regularizer handed to the trainer,
//! so the same model type backs the Linear, Lasso and Ridge estimators.

use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use crate::trainer::TrainingError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Trainable parameters of a linear model: weights and bias.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LinearParams {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
        }
    }
}

/// Serializable representation of linear model parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializableLinearParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl From<&LinearParams> for SerializableLinearParams {
    fn from(params: &LinearParams) -> Self {
        Self {
            weights: params.weights.to_vec(),
            bias: params.bias,
        }
    }
}

impl TryFrom<SerializableLinearParams> for LinearParams {
    type Error = TrainingError;

    fn try_from(value: SerializableLinearParams) -> Result<Self, Self::Error> {
        if !value.bias.is_finite() || value.weights.iter().any(|w| !w.is_finite()) {
            return Err(TrainingError::Diverged(
                "stored parameters contain non-finite values".to_string(),
            ));
        }
        Ok(Self {
            weights: Array1::from(value.weights),
            bias: value.bias,
        })
    }
}

impl ParamOps for LinearParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, scalar: f64) -> Self {
        Self {
            weights: &self.weights * scalar,
            bias: self.bias * scalar,
        }
    }
}

/// A linear model `y = X·w + b` with its training state in the type.
#[derive(Clone, Debug)]
pub struct LinearModel<S> {
    params: LinearParams,
    fit_intercept: bool,
    _state: PhantomData<S>,
}

impl<S> LinearModel<S> {
    pub fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.params.weights
    }

    pub fn bias(&self) -> f64 {
        self.params.bias
    }
}

impl LinearModel<Fitted> {
    pub fn new(params: LinearParams) -> Self {
        Self {
            params,
            fit_intercept: true,
            _state: PhantomData,
        }
    }
}

impl InferenceModel for LinearModel<Fitted> {
    type InputSingle = Array1<f64>;
    type OutputSingle = f64;
    type InputBatch = Array2<f64>;
    type OutputBatch = Array1<f64>;
    type ParamsRepr = SerializableLinearParams;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle {
        self.params.weights.dot(input) + self.params.bias
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch {
        input.dot(&self.params.weights) + self.params.bias
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        (&self.params).into()
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self, TrainingError> {
        Ok(Self::new(LinearParams::try_from(params)?))
    }
}

/// Forward pass `X·w + b`; backward pass `∇w = Xᵀ·g`, `∇b = Σg`
/// (zero when the intercept is disabled).
impl TrainableModel for LinearModel<Unfitted> {
    type Input = Array2<f64>;
    type Prediction = Array1<f64>;
    type Params = LinearParams;
    type Gradients = LinearParams;
    type Output = LinearModel<Fitted>;

    fn forward(&self, x: &Self::Input) -> Self::Prediction {
        x.dot(&self.params.weights) + self.params.bias
    }

    fn backward(&self, x: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients {
        LinearParams {
            weights: x.t().dot(grad_output),
            bias: if self.fit_intercept {
                grad_output.sum()
            } else {
                0.0
            },
        }
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, params: &Self::Params) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> LinearModel<Fitted> {
        LinearModel {
            params: self.params,
            fit_intercept: self.fit_intercept,
            _state: PhantomData,
        }
    }
}

/// An unfitted linear regression model.
pub type LinearRegression = LinearModel<Unfitted>;

impl LinearRegression {
    /// Zero-initialized model with an intercept.
    pub fn new(n_features: usize) -> Self {
        Self {
            params: LinearParams::zeros(n_features),
            fit_intercept: true,
            _state: PhantomData,
        }
    }

    /// Disables the intercept; the bias stays at its initial value.
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Warm start from explicit parameters.
    pub fn from_params(params: LinearParams) -> Self {
        Self {
            params,
            fit_intercept: true,
            _state: PhantomData,
        }
    }
}
