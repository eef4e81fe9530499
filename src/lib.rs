//! Education-indicator MLOps toolkit.
//!
//! Scrapes per-university monitoring indicators into a workbook, loads the
//! workbook into SQLite, trains linear-family regressors (`LINEAR`, `LASSO`,
//! `RIDGE`) on the stored data and serves artifact and hyperparameter
//! management over REST.
//!
//! Learning stack, bottom-up:
//! - [`model`], [`loss`], [`optimizer`], [`regularizers`], [`trainer`]:
//!   type-state linear model trained by mini-batch gradient descent;
//! - [`preprocessing`]: imputation, one-hot encoding and scaling with
//!   serializable fitted state;
//! - [`dataset`], [`estimator`], [`pipe`]: split, fit, persist, predict.

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod estimator;
pub mod literal;
pub mod logging;
pub mod loss;
pub mod model;
pub mod optimizer;
pub mod pipe;
pub mod preprocessing;
pub mod registry;
pub mod regularizers;
pub mod schema;
pub mod scrape;
pub mod serialization;
pub mod service;
pub mod spreadsheet;
pub mod storage;
pub mod table;
pub mod tasks;
pub mod trainer;

pub use config::Settings;
pub use error::{Error, Result};
pub use model::{Fitted, Unfitted};
pub use registry::ModelKind;
