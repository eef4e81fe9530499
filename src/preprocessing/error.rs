use crate::table::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessingError {
    #[error("expected {expected}, got {got}")]
    InvalidShape { expected: String, got: String },
    /// A NaN reached a step that needs gap-free input.
    #[error("missing value in {0}")]
    MissingValues(String),
    #[error("invalid preprocessing parameter: {0}")]
    InvalidParameter(String),
    #[error("cannot decode fitted state: {0}")]
    SerializationError(String),
    #[error("nothing to fit: {0}")]
    EmptyData(String),
    #[error("fitted on {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// A column seen at fit time is absent from the input table.
    #[error("column '{0}' not in table")]
    UnknownColumn(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<bincode::Error> for PreprocessingError {
    fn from(err: bincode::Error) -> Self {
        PreprocessingError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_mismatch_message() {
        let err = PreprocessingError::FeatureMismatch {
            expected_features: 5,
            got_features: 3,
        };
        assert_eq!(err.to_string(), "fitted on 5 features, got 3");
    }

    #[test]
    fn test_unknown_column_names_the_column() {
        let err = PreprocessingError::UnknownColumn("wage".to_string());
        assert_eq!(err.to_string(), "column 'wage' not in table");
    }

    #[test]
    fn test_bincode_failure_maps_to_serialization() {
        let decoded: Result<String, bincode::Error> = bincode::deserialize(&[0xff, 0xff, 0xff, 0xff]);
        let err: PreprocessingError = decoded.unwrap_err().into();
        assert!(matches!(err, PreprocessingError::SerializationError(_)));
    }
}
