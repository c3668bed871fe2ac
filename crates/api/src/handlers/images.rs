//! Handlers for browsing generated-image records.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::images::GeneratedImage;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<GeneratedImage>,
}

/// GET /api/images -- all stored records, newest first.
pub async fn list_images(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let images = state.images.list().await;
    tracing::info!(count = images.len(), "Returning stored images");
    Ok(Json(ImagesResponse { images }))
}

/// GET /api/images/{id} -- one record by id.
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let image = state
        .images
        .get(&image_id)
        .await
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    Ok(Json(image))
}
