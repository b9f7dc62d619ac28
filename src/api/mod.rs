//! REST API over the component registry.
//!
//! ```text
//! GET    /health
//! GET    /api/components
//! GET    /api/components/:id
//! PUT    /api/components/:id
//! DELETE /api/components/:id
//! ```

pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::paths::API_PREFIX;
use crate::registry::Registry;

pub use error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            API_PREFIX,
            Router::new()
                .route("/", get(handlers::list_components))
                .route(
                    "/:id",
                    get(handlers::get_component)
                        .put(handlers::put_component)
                        .delete(handlers::delete_component),
                ),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `address` and serve until the process exits
pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Content hub API listening on http://{}", address);

    axum::serve(listener, create_router(state))
        .await
        .context("Server error")?;
    Ok(())
}
