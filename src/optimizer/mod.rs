use crate::model::linear::LinearParams;
use crate::model::ParamOps;

/// Gradient-based parameter update.
///
/// Training logic lives in the [`Trainer`](crate::trainer::Trainer); the
/// optimizer only maps `(params, gradients)` to new params. `step` returns a
/// new value instead of mutating its inputs.
pub trait Optimizer<P> {
    /// `params_new = params - learning_rate * gradients` for plain SGD.
    fn step(&self, params: &P, gradients: &P) -> P;

    /// Step size applied to the gradients; proximal regularizers scale by it.
    fn learning_rate(&self) -> f64;
}

/// Stochastic Gradient Descent: `θ ← θ - η · ∇L(θ)`.
///
/// Stateless: no momentum and no adaptive learning rate.
#[derive(Clone, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }
}

impl Optimizer<LinearParams> for SGD {
    fn step(&self, params: &LinearParams, grads: &LinearParams) -> LinearParams {
        params.add(&grads.scale(-self.lr))
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }
}
