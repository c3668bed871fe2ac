//! Handler extracting basic metadata from an image URL.

use std::io::Cursor;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::publish::download_image;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    pub image_url: String,
}

/// POST /api/extract-metadata
///
/// Downloads the image and reads its header only; the pixel data is never
/// decoded.
pub async fn extract_metadata(
    State(state): State<AppState>,
    Json(request): Json<MetadataRequest>,
) -> AppResult<impl IntoResponse> {
    if request.image_url.is_empty() {
        return Err(AppError::BadRequest("No image URL provided".to_string()));
    }

    let bytes = download_image(&state, &request.image_url).await?;
    let size_bytes = bytes.len();

    let reader = image::ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| AppError::BadRequest(format!("Unreadable image data: {e}")))?;
    let format = reader
        .format()
        .map(|f| format!("{f:?}").to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| AppError::BadRequest(format!("Failed to parse image: {e}")))?;

    tracing::info!(%format, width, height, size_bytes, "Extracted image metadata");

    Ok(Json(json!({
        "success": true,
        "metadata": {
            "format": format,
            "width": width,
            "height": height,
            "size_bytes": size_bytes,
            "imageUrl": request.image_url,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }
    })))
}
