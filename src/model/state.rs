/// Marker for a model that has not been trained yet.
///
/// `LinearModel<Unfitted>` exposes the training interface only; there is no
/// way to call `predict` on it.
#[derive(Clone, Copy, Debug)]
pub struct Unfitted;

/// Marker for a trained model.
///
/// A `Fitted` model holds inference parameters only: no optimizer state, loss
/// or training hyperparameters.
#[derive(Clone, Copy, Debug)]
pub struct Fitted;
