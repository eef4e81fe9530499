//! Closed registry of trainable model families.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Estimator family selectable for training.
///
/// Serialized by its public identifier (`"LASSO_REGRESSION"`, ...), which is
/// also what the REST surface accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "LASSO_REGRESSION")]
    LassoRegression,
    #[serde(rename = "LINEAR_REGRESSION")]
    LinearRegression,
    #[serde(rename = "RIDGE_REGRESSION")]
    RidgeRegression,
}

impl ModelKind {
    /// Every registered family, in id order.
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LassoRegression,
        ModelKind::LinearRegression,
        ModelKind::RidgeRegression,
    ];

    /// Public identifier.
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LassoRegression => "LASSO_REGRESSION",
            ModelKind::LinearRegression => "LINEAR_REGRESSION",
            ModelKind::RidgeRegression => "RIDGE_REGRESSION",
        }
    }

    /// Stable integer id.
    pub fn id(self) -> u8 {
        match self {
            ModelKind::LassoRegression => 1,
            ModelKind::LinearRegression => 2,
            ModelKind::RidgeRegression => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Identifier with underscores removed and title-cased: `Lassoregression`.
    pub fn display_name(self) -> String {
        let squashed: String = self.name().chars().filter(|&c| c != '_').collect();
        let mut chars = squashed.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }

    /// File name of this family's hyperparameter document.
    pub fn params_file_name(self) -> String {
        format!("{}_parameters.json", self.display_name())
    }

    /// `{name: id}` listing served by `GET /models`.
    pub fn listing() -> BTreeMap<&'static str, u8> {
        Self::ALL.iter().map(|kind| (kind.name(), kind.id())).collect()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unregistered model identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model '{0}', expected one of LASSO_REGRESSION, LINEAR_REGRESSION, RIDGE_REGRESSION")]
pub struct UnknownModel(pub String);

impl FromStr for ModelKind {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownModel(s.to_string()))
    }
}
