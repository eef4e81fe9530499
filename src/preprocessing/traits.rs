//! Fit/transform contract shared by every preprocessing step.

use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;

/// A step configured but not yet fitted.
///
/// Fitting reads the training data once and produces the matching
/// [`FittedTransformer`]; the step itself keeps no learned state.
pub trait Transformer: Clone {
    type Input;
    type Output;
    /// Plain form of the learned state, as stored in model artifacts.
    type Params: SerializableParams;
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError>;

    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.fit(data)?.transform(data)
    }
}

/// A step carrying learned state.
///
/// `transform` never mutates that state, so applying it twice to the same
/// table yields the same matrix. `from_params(extract_params())` restores an
/// equivalent step.
pub trait FittedTransformer: Clone {
    type Input;
    type Output;
    type Params: SerializableParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError>;

    fn extract_params(&self) -> Self::Params;

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Input width seen at fit time.
    fn n_features_in(&self) -> usize;
}
