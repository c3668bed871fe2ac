//! Handlers serving static catalog data to the frontend.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/workflows
pub async fn get_workflows(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!(count = state.catalog.workflows.len(), "Returning workflows");
    Ok(Json(json!({ "workflows": state.catalog.workflows })))
}

/// GET /api/refiners
pub async fn get_refiners(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::info!(count = state.catalog.refiners.len(), "Returning refiners");
    Ok(Json(json!({ "refiners": state.catalog.refiners })))
}

/// GET /api/refiner-params/{id}
pub async fn get_refiner_params(
    State(state): State<AppState>,
    Path(refiner_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let entry = state
        .catalog
        .refiner_params_for(&refiner_id)
        .ok_or_else(|| AppError::NotFound("Refiner not found".to_string()))?;
    Ok(Json(entry.clone()))
}

/// GET /api/global-options
pub async fn get_global_options(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(json!({ "global_options": state.catalog.global_options })))
}
