//! Handler for publishing a generated image to a destination.
//!
//! Supported destinations are `output_file` (written under the configured
//! publish directory) and `s3` (mocked; returns a placeholder path).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::upload::sanitize_filename;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub image_url: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default = "default_destination_type")]
    pub destination_type: String,
    #[serde(default)]
    pub destination_file: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_destination_type() -> String {
    "output_file".to_string()
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub success: bool,
    pub message: String,
    pub path: String,
}

/// POST /api/publish-image
pub async fn publish_image(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> AppResult<impl IntoResponse> {
    if request.image_url.is_empty() {
        return Err(AppError::BadRequest("No image URL provided".to_string()));
    }
    // Reject unknown destinations before touching the network.
    if request.destination_type != "output_file" && request.destination_type != "s3" {
        return Err(AppError::BadRequest(format!(
            "Unsupported destination type: {}",
            request.destination_type
        )));
    }

    let file_name = request
        .destination_file
        .as_deref()
        .or(request.destination.as_deref())
        .map(sanitize_filename)
        .unwrap_or_else(|| format!("published-{}.png", uuid::Uuid::new_v4()));

    if request.destination_type == "s3" {
        tracing::info!(file = %file_name, "Mock-publishing image to S3");
        return Ok(Json(PublishResponse {
            success: true,
            message: "Image published to S3 (mock)".to_string(),
            path: format!("s3://mock-bucket/{file_name}"),
        }));
    }

    let bytes = download_image(&state, &request.image_url).await?;

    tokio::fs::create_dir_all(&state.config.publish_dir).await?;
    let path = state.config.publish_dir.join(&file_name);
    tokio::fs::write(&path, &bytes).await?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "Published image");

    Ok(Json(PublishResponse {
        success: true,
        message: "Image published".to_string(),
        path: path.display().to_string(),
    }))
}

/// Fetch the image bytes from the source URL.
pub(crate) async fn download_image(state: &AppState, url: &str) -> AppResult<Vec<u8>> {
    let response = state
        .http
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to fetch image: {e}")))?;
    if !response.status().is_success() {
        return Err(AppError::BadRequest(format!(
            "Failed to fetch image: HTTP {}",
            response.status().as_u16()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read image body: {e}")))?;
    Ok(bytes.to_vec())
}
