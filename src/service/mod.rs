//! REST surface over the artifact store and the training workflow.

pub mod error;
pub mod handlers;

pub use error::ServerError;

use crate::artifacts::ArtifactStore;
use crate::config::Settings;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppContext {
    settings: Settings,
    store: ArtifactStore,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let store = ArtifactStore::from_settings(&settings);
        Self { settings, store }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/models", get(handlers::list_models))
        .route(
            "/estimated_models",
            get(handlers::list_estimated)
                .post(handlers::train_model)
                .delete(handlers::delete_estimated),
        )
        .route(
            "/model_parameters",
            get(handlers::get_parameters).put(handlers::put_parameters),
        )
        .with_state(ctx)
}

/// Serves `router` on `listener` until Ctrl-C.
pub async fn serve(listener: tokio::net::TcpListener, ctx: Arc<AppContext>) -> std::io::Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), "listening");
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
