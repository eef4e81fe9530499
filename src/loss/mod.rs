use ndarray::Array1;

/// A differentiable loss used during training.
///
/// Implementors define the scalar loss (for logging) and its gradient with
/// respect to the predictions, which is fed to the model's `backward()`.
pub trait Loss {
    type Prediction;
    type Target;

    fn loss(&self, prediction: &Self::Prediction, target: &Self::Target) -> f64;

    /// ∂L/∂pred, passed to `model.backward()`.
    fn grad_wrt_prediction(
        &self,
        prediction: &Self::Prediction,
        target: &Self::Target,
    ) -> Self::Prediction;
}

/// Mean Squared Error: `L = (1/n) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `(pred - target) / n`. The factor of 2 is
/// absorbed into the learning rate.
#[derive(Clone, Copy, Debug, Default)]
pub struct MSELoss;

impl Loss for MSELoss {
    type Prediction = Array1<f64>;
    type Target = Array1<f64>;

    fn loss(&self, pred: &Self::Prediction, target: &Self::Target) -> f64 {
        if pred.is_empty() {
            return 0.0;
        }
        let diff = pred - target;
        diff.dot(&diff) / pred.len() as f64
    }

    fn grad_wrt_prediction(&self, pred: &Self::Prediction, target: &Self::Target) -> Array1<f64> {
        if pred.is_empty() {
            return Array1::zeros(0);
        }
        (pred - target) / pred.len() as f64
    }
}
