//! REST handlers.

use crate::artifacts::ArtifactError;
use crate::estimator::{Estimator, Hyperparameters};
use crate::literal::parse_mapping;
use crate::registry::ModelKind;
use crate::service::error::{Result, ServerError};
use crate::service::AppContext;
use crate::tasks;
use crate::trainer::TrainingError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const TRAINING_COMPLETED: &str = "Model training completed";
pub const PARAMETERS_UPDATED: &str = "Parameters updated.";
pub const MODEL_FILE_NOT_FOUND: &str = "Given file not found. Check path and filename and try again.";
pub const PARAMS_FILE_NOT_FOUND: &str = "Given file not found. Check path and model and try again.";

#[derive(Debug, Deserialize, Serialize)]
pub struct ModelRequest {
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ParametersRequest {
    pub model: String,
    pub model_params: String,
}

fn model_kind(name: &str) -> Result<ModelKind> {
    name.parse::<ModelKind>()
        .map_err(|e| ServerError::validation("model", e.to_string()))
}

/// `GET /models`
pub async fn list_models() -> Json<BTreeMap<&'static str, u8>> {
    Json(ModelKind::listing())
}

/// `GET /estimated_models`
pub async fn list_estimated(State(ctx): State<Arc<AppContext>>) -> Result<Json<Value>> {
    let models = ctx.store().list().map_err(crate::Error::from)?;
    Ok(Json(json!({ "Estimated models": models })))
}

/// A stored parameter document that does not resolve for the family is the
/// caller's fault, not a server failure.
fn training_failure(error: crate::Error) -> ServerError {
    match error {
        crate::Error::Training(TrainingError::InvalidHyperparameter(message)) => {
            ServerError::validation("model_params", message)
        }
        crate::Error::Artifact(ArtifactError::Json { source, .. }) => {
            ServerError::validation("model_params", source.to_string())
        }
        other => other.into(),
    }
}

/// `POST /estimated_models`: trains on the blocking pool.
pub async fn train_model(
    State(ctx): State<Arc<AppContext>>,
    payload: std::result::Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<&'static str>> {
    let Json(request) = payload?;
    let kind = model_kind(&request.model)?;
    info!(model = %kind, "training requested");

    let settings = ctx.settings().clone();
    tokio::task::spawn_blocking(move || tasks::train(&settings, kind))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(training_failure)?;
    Ok(Json(TRAINING_COMPLETED))
}

/// `DELETE /estimated_models`
pub async fn delete_estimated(
    State(ctx): State<Arc<AppContext>>,
    payload: std::result::Result<Json<ModelRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(request) = payload?;
    match ctx.store().delete(&request.model) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(ArtifactError::NotFound(_)) => Err(ServerError::NotFound(MODEL_FILE_NOT_FOUND.into())),
        Err(ArtifactError::InvalidName(name)) => Err(ServerError::validation(
            "model",
            format!("'{name}' is not a plain file name"),
        )),
        Err(e) => Err(crate::Error::from(e).into()),
    }
}

/// `GET /model_parameters`
pub async fn get_parameters(
    State(ctx): State<Arc<AppContext>>,
    payload: std::result::Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload?;
    let kind = model_kind(&request.model)?;
    match ctx.store().read_params(kind) {
        Ok(document) => Ok(Json(document)),
        Err(ArtifactError::NotFound(_)) => Err(ServerError::NotFound(PARAMS_FILE_NOT_FOUND.into())),
        Err(e) => Err(crate::Error::from(e).into()),
    }
}

/// `PUT /model_parameters`: replaces the family's document with the parsed
/// literal once it resolves to valid hyperparameters for the family.
pub async fn put_parameters(
    State(ctx): State<Arc<AppContext>>,
    payload: std::result::Result<Json<ParametersRequest>, JsonRejection>,
) -> Result<Json<&'static str>> {
    let Json(request) = payload?;
    let kind = model_kind(&request.model)?;
    let params = parse_mapping(&request.model_params)
        .map_err(|e| ServerError::validation("model_params", e.to_string()))?;
    Hyperparameters::from_json(Value::Object(params.clone()))
        .and_then(|hyperparameters| Estimator::with_hyperparameters(kind, &hyperparameters))
        .map_err(|e| ServerError::validation("model_params", e.to_string()))?;
    ctx.store()
        .write_params(kind, &params)
        .map_err(crate::Error::from)?;
    info!(model = %kind, "parameters updated");
    Ok(Json(PARAMETERS_UPDATED))
}
