//! Preprocessing transformers.
//!
//! Every transformer comes in two states: an unfitted [`Transformer`] holding
//! hyperparameters and a [`FittedTransformer`] holding learned state that can
//! be serialized and reused on new data.
//!
//! - [`SimpleImputer`]: per-column fill values.
//! - [`StandardScaler`]: zero mean, unit variance.
//! - [`OneHotEncoder`]: categorical strings to indicator blocks.
//! - [`ColumnTransformer`]: transformers over named column subsets.
//! - [`Preprocessor`]: the full tabular pipeline used for training.

pub mod column_transformer;
pub mod encoding;
pub mod error;
pub mod imputation;
pub mod pipeline;
pub mod scaling;
pub mod traits;

pub use column_transformer::{ColumnStep, ColumnTransformer, FittedColumnTransformer};
pub use encoding::{FittedOneHotEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams};
pub use error::PreprocessingError;
pub use imputation::{FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams};
pub use pipeline::{
    FittedPreprocessor, Preprocessor, PreprocessorParams, CATEGORICAL_SENTINEL,
    MOSTLY_MISSING_THRESHOLD,
};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
