use crate::model::linear::{LinearParams, LinearRegression};
use crate::model::TrainableModel;

/// Penalty term added to the loss during training.
///
/// Smooth penalties contribute through their gradient. Non-smooth ones return
/// a zero gradient and act in [`proximal`](Regularizer::proximal) instead,
/// which the trainer applies after every optimizer step.
pub trait Regularizer<M: TrainableModel> {
    /// Penalty value (for the reported loss) and its gradient.
    fn regularizer_penalty_grad(&self, model: &M) -> (f64, M::Gradients);

    /// Proximal map of `step * penalty`; identity by default.
    fn proximal(&self, params: M::Params, _step: f64) -> M::Params {
        params
    }
}

/// No penalty (ordinary least squares).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegularizer;

impl Regularizer<LinearRegression> for NoRegularizer {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        (0.0, LinearParams::zeros(model.n_features()))
    }
}

/// L1 penalty `alpha * Σ|w|`, applied by soft-thresholding so weights can
/// reach exactly zero. The bias is not penalized.
#[derive(Clone, Copy, Debug)]
pub struct L1 {
    alpha: f64,
}

impl L1 {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Regularizer<LinearRegression> for L1 {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        let weights = &model.params().weights;
        let penalty = self.alpha * weights.mapv(f64::abs).sum();
        (penalty, LinearParams::zeros(model.n_features()))
    }

    fn proximal(&self, params: LinearParams, step: f64) -> LinearParams {
        let threshold = self.alpha * step;
        LinearParams {
            weights: params
                .weights
                .mapv(|w| w.signum() * (w.abs() - threshold).max(0.0)),
            bias: params.bias,
        }
    }
}

/// L2 penalty `lambda * ‖w‖²`, gradient `2 * lambda * w`.
/// The bias is not penalized.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Regularizer<LinearRegression> for L2 {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        let weights = &model.params().weights;
        let penalty = self.lambda * weights.dot(weights);
        (
            penalty,
            LinearParams {
                weights: weights * (2.0 * self.lambda),
                bias: 0.0,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn model() -> LinearRegression {
        LinearRegression::from_params(LinearParams {
            weights: array![2.0, -1.0, 0.0],
            bias: 5.0,
        })
    }

    #[test]
    fn test_no_regularizer() {
        let (penalty, grad) = NoRegularizer.regularizer_penalty_grad(&model());
        assert_eq!(penalty, 0.0);
        assert_eq!(grad, LinearParams::zeros(3));
    }

    #[test]
    fn test_l1_penalty_has_no_gradient() {
        let (penalty, grad) = L1::new(0.5).regularizer_penalty_grad(&model());
        assert_eq!(penalty, 1.5);
        assert_eq!(grad, LinearParams::zeros(3));
    }

    #[test]
    fn test_l1_soft_threshold() {
        let params = LinearParams {
            weights: array![2.0, -1.0, 0.05, -0.1],
            bias: 5.0,
        };
        let shrunk = L1::new(0.5).proximal(params, 0.2);
        assert_eq!(shrunk.weights, array![1.9, -0.9, 0.0, 0.0]);
        assert_eq!(shrunk.bias, 5.0);
    }

    #[test]
    fn test_smooth_penalties_keep_params() {
        let params = model().params().clone();
        assert_eq!(L2::new(0.1).proximal(params.clone(), 0.5), params);
        assert_eq!(NoRegularizer.proximal(params.clone(), 0.5), params);
    }

    #[test]
    fn test_l2() {
        let (penalty, grad) = L2::new(0.1).regularizer_penalty_grad(&model());
        assert!((penalty - 0.5).abs() < 1e-12);
        assert!((grad.weights[0] - 0.4).abs() < 1e-12);
        assert!((grad.weights[1] + 0.2).abs() < 1e-12);
        assert_eq!(grad.bias, 0.0);
    }
}
