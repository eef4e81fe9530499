//! Linear-family estimators selected by [`ModelKind`].
//!
//! All three families share [`LinearRegression`] and the gradient-descent
//! [`Trainer`]; they differ only in the regularizer:
//!
//! | family | objective |
//! |---|---|
//! | `LINEAR_REGRESSION` | `(1/2n)·‖y − Xw − b‖²` |
//! | `LASSO_REGRESSION` | `(1/2n)·‖y − Xw − b‖² + α·‖w‖₁` |
//! | `RIDGE_REGRESSION` | `‖y − Xw − b‖² + α·‖w‖²` |
//!
//! The trainer minimizes a `1/2n`-scaled data term, so the ridge penalty is
//! handed to [`L2`] as `α/(2n)`. The lasso penalty is applied as a proximal
//! soft-threshold after each step, so irrelevant coefficients reach exact zeros.
//!
//! Unless `learning_rate` is given, the step size is derived from the data as
//! `1 / L`, where `L` bounds the curvature of the objective: the mean squared
//! row norm (the largest one for mini-batches), plus 1 for the intercept, plus
//! the ridge curvature. Gradient descent then cannot diverge however wide or
//! correlated the design matrix is.

use crate::dataset::InMemoryDataset;
use crate::loss::MSELoss;
use crate::model::linear::{LinearModel, LinearRegression, SerializableLinearParams};
use crate::model::{Fitted, InferenceModel};
use crate::optimizer::SGD;
use crate::registry::ModelKind;
use crate::regularizers::{NoRegularizer, L1, L2};
use crate::trainer::{Trainer, TrainingError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Hyperparameter document as stored in `<Family>_parameters.json`.
///
/// Every field is optional; absent fields take the family defaults. Keys this
/// crate does not understand are kept in `extra` and ignored with a warning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iter: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    /// 0 or absent: full batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_intercept: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Hyperparameters {
    pub fn from_json(value: serde_json::Value) -> Result<Self, TrainingError> {
        serde_json::from_value(value)
            .map_err(|e| TrainingError::InvalidHyperparameter(e.to_string()))
    }
}

/// Gradient-descent settings shared by every family.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DescentConfig {
    /// `None` derives a stable step from the training data.
    pub learning_rate: Option<f64>,
    pub max_iter: usize,
    pub batch_size: usize,
    pub fit_intercept: bool,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            learning_rate: None,
            max_iter: DEFAULT_MAX_ITER,
            batch_size: 0,
            fit_intercept: true,
        }
    }
}

/// An unfitted estimator with resolved hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Estimator {
    Linear { config: DescentConfig },
    Lasso { alpha: f64, config: DescentConfig },
    Ridge { alpha: f64, config: DescentConfig },
}

impl Estimator {
    /// Estimator with the family defaults.
    pub fn new(kind: ModelKind) -> Self {
        let config = DescentConfig::default();
        match kind {
            ModelKind::LinearRegression => Estimator::Linear { config },
            ModelKind::LassoRegression => Estimator::Lasso {
                alpha: DEFAULT_ALPHA,
                config,
            },
            ModelKind::RidgeRegression => Estimator::Ridge {
                alpha: DEFAULT_ALPHA,
                config,
            },
        }
    }

    /// Estimator with `params` applied over the family defaults.
    pub fn with_hyperparameters(
        kind: ModelKind,
        params: &Hyperparameters,
    ) -> Result<Self, TrainingError> {
        for key in params.extra.keys() {
            warn!(model = %kind, key = %key, "ignoring unsupported hyperparameter");
        }

        let mut config = DescentConfig::default();
        if let Some(lr) = params.learning_rate {
            if !(lr.is_finite() && lr > 0.0) {
                return Err(TrainingError::InvalidHyperparameter(format!(
                    "learning_rate must be positive, got {lr}"
                )));
            }
            config.learning_rate = Some(lr);
        }
        if let Some(max_iter) = params.max_iter {
            if max_iter == 0 {
                return Err(TrainingError::InvalidHyperparameter(
                    "max_iter must be at least 1".to_string(),
                ));
            }
            config.max_iter = max_iter;
        }
        if let Some(batch_size) = params.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(fit_intercept) = params.fit_intercept {
            config.fit_intercept = fit_intercept;
        }

        let alpha = match params.alpha {
            Some(alpha) if !(alpha.is_finite() && alpha >= 0.0) => {
                return Err(TrainingError::InvalidHyperparameter(format!(
                    "alpha must be non-negative, got {alpha}"
                )))
            }
            Some(alpha) => alpha,
            None => DEFAULT_ALPHA,
        };

        Ok(match kind {
            ModelKind::LinearRegression => {
                if params.alpha.is_some() {
                    return Err(TrainingError::InvalidHyperparameter(
                        "alpha is not a LINEAR_REGRESSION parameter".to_string(),
                    ));
                }
                Estimator::Linear { config }
            }
            ModelKind::LassoRegression => Estimator::Lasso { alpha, config },
            ModelKind::RidgeRegression => Estimator::Ridge { alpha, config },
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::Linear { .. } => ModelKind::LinearRegression,
            Estimator::Lasso { .. } => ModelKind::LassoRegression,
            Estimator::Ridge { .. } => ModelKind::RidgeRegression,
        }
    }

    pub fn config(&self) -> &DescentConfig {
        match self {
            Estimator::Linear { config }
            | Estimator::Lasso { config, .. }
            | Estimator::Ridge { config, .. } => config,
        }
    }

    pub fn fit(&self, x: Array2<f64>, y: Array1<f64>) -> Result<FittedEstimator, TrainingError> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let config = *self.config();
        let ridge_lambda = match *self {
            Estimator::Ridge { alpha, .. } => alpha / (2.0 * n_samples as f64),
            _ => 0.0,
        };
        let learning_rate = match config.learning_rate {
            Some(lr) => lr,
            None => stable_step(&x, &config, 2.0 * ridge_lambda),
        };
        debug!(model = %self.kind(), learning_rate, "step size");
        let dataset = InMemoryDataset::new(x, y).map_err(TrainingError::Data)?;
        let model = LinearRegression::new(n_features).with_intercept(config.fit_intercept);
        let optimizer = SGD::new(learning_rate);

        let fitted = match *self {
            Estimator::Linear { .. } => Trainer::builder(MSELoss, optimizer, NoRegularizer)
                .batch_size(config.batch_size)
                .max_epochs(config.max_iter)
                .build()
                .fit(model, &dataset)?,
            Estimator::Lasso { alpha, .. } => Trainer::builder(MSELoss, optimizer, L1::new(alpha))
                .batch_size(config.batch_size)
                .max_epochs(config.max_iter)
                .build()
                .fit(model, &dataset)?,
            Estimator::Ridge { .. } => Trainer::builder(MSELoss, optimizer, L2::new(ridge_lambda))
                .batch_size(config.batch_size)
                .max_epochs(config.max_iter)
                .build()
                .fit(model, &dataset)?,
        };

        info!(model = %self.kind(), n_samples, n_features, "estimator fitted");
        Ok(FittedEstimator {
            kind: self.kind(),
            model: fitted,
        })
    }
}

/// `1 / L` for an upper bound `L` on the largest Hessian eigenvalue of one
/// descent step. The Hessian trace is the mean squared row norm of the batch
/// (plus 1 for the intercept column), and bounds every eigenvalue.
fn stable_step(x: &Array2<f64>, config: &DescentConfig, penalty_curvature: f64) -> f64 {
    let row_norms = x.rows().into_iter().map(|row| row.dot(&row));
    let full_batch = config.batch_size == 0 || config.batch_size >= x.nrows();
    let spread = if full_batch {
        row_norms.sum::<f64>() / x.nrows().max(1) as f64
    } else {
        row_norms.fold(0.0, f64::max)
    };
    let intercept = if config.fit_intercept { 1.0 } else { 0.0 };
    let curvature = spread + intercept + penalty_curvature;
    if curvature.is_finite() && curvature > 0.0 {
        1.0 / curvature
    } else {
        1.0
    }
}

/// Serializable state of a [`FittedEstimator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    pub kind: ModelKind,
    pub linear: SerializableLinearParams,
}

#[derive(Clone, Debug)]
pub struct FittedEstimator {
    kind: ModelKind,
    model: LinearModel<Fitted>,
}

impl FittedEstimator {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        self.model.weights()
    }

    pub fn intercept(&self) -> f64 {
        self.model.bias()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        if x.ncols() != self.n_features() {
            return Err(TrainingError::Data(format!(
                "expected {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(self.model.predict_batch(x))
    }

    pub fn extract_params(&self) -> EstimatorParams {
        EstimatorParams {
            kind: self.kind,
            linear: self.model.extract_params(),
        }
    }

    pub fn from_params(params: EstimatorParams) -> Result<Self, TrainingError> {
        Ok(Self {
            kind: params.kind,
            model: LinearModel::<Fitted>::from_params(params.linear)?,
        })
    }
}
