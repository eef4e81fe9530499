//! Model traits and the type-state markers separating training from inference.

pub mod linear;
pub mod state;

pub use state::{Fitted, Unfitted};

/// Training-side interface driven by the [`Trainer`](crate::trainer::Trainer).
pub trait TrainableModel {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    /// Consumes the trainable model, keeping only what inference needs.
    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic on parameter sets, as needed by optimizers and regularizers.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: f64) -> Self;
}

/// Inference-side interface of a trained model.
pub trait InferenceModel {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;
    /// Plain serializable representation of the parameters.
    type ParamsRepr;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;

    fn extract_params(&self) -> Self::ParamsRepr;
    fn from_params(params: Self::ParamsRepr) -> Result<Self, crate::trainer::TrainingError>
    where
        Self: Sized;
}
