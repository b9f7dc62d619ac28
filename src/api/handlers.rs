//! Request handlers for the components API.
//!
//! Every handler initializes the registry on first use.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::domain::{Component, ComponentUpdate};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "content-hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/components
pub async fn list_components(State(state): State<AppState>) -> Json<Vec<Component>> {
    state.registry.initialize().await;
    Json(state.registry.get_all_components().await)
}

/// GET /api/components/:id
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Component>, ApiError> {
    state.registry.initialize().await;
    state
        .registry
        .get_component_by_id(&id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// PUT /api/components/:id
pub async fn put_component(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut update): Json<ComponentUpdate>,
) -> Result<Json<Component>, ApiError> {
    match update.id.as_deref() {
        Some(body_id) if body_id != id => {
            return Err(ApiError::BadRequest(format!(
                "Component ID mismatch: path {:?}, body {:?}",
                id, body_id
            )));
        }
        Some(_) => {}
        None => update.id = Some(id),
    }

    state.registry.initialize().await;
    let component = state.registry.register_component(update).await?;
    Ok(Json(component))
}

/// DELETE /api/components/:id
///
/// 404 for unknown ids; 500 when a known component cannot be deleted.
pub async fn delete_component(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.registry.initialize().await;
    if state.registry.get_component_by_id(&id).await.is_none() {
        return Err(ApiError::NotFound(id));
    }

    if state.registry.delete_component(&id).await {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::Internal(format!("Failed to delete component: {}", id)))
    }
}
