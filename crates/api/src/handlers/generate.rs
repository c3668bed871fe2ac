//! Handler for the image-generation endpoint.
//!
//! `POST /api/generate-image` takes a multipart form: a `data` field
//! holding the request JSON, plus zero or more `image` file parts
//! (reference images, saved to the upload directory). The pipeline is:
//! refine the prompt (optional), load the workflow template, build the
//! directive set from the generation parameters, resolve the template,
//! submit to RunPod, and record one image per batch index.

use std::path::PathBuf;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use prompter_core::directives::directive_set;
use prompter_core::params::GenerationParams;
use prompter_core::workflow::resolve;
use prompter_runpod::JobPayload;

use crate::error::{AppError, AppResult};
use crate::images::GeneratedImage;
use crate::state::AppState;
use crate::upload;

/// System prompt used in metaprompt mode, looked up via the template store.
const METAPROMPT_SYSTEM_FILE: &str = "default-system-prompt.txt";

/// Request JSON carried in the multipart `data` field.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    /// Workflow label shown in the UI (distinct from the template file,
    /// which lives in `params.workflow`).
    #[serde(default = "default_workflow_label")]
    pub workflow: String,
    /// Generation parameters; unknown keys are ignored.
    #[serde(default)]
    pub params: Value,
    /// Opaque global parameters, echoed back on stored records.
    #[serde(default)]
    pub global_params: Value,
    #[serde(default = "default_refiner")]
    pub refiner: String,
    #[serde(default)]
    pub refiner_params: Value,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub has_reference_image: bool,
}

fn default_workflow_label() -> String {
    "text-to-image".to_string()
}

fn default_refiner() -> String {
    "none".to_string()
}

fn default_batch_size() -> u32 {
    1
}

/// Response for a successful generation.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub images: Vec<GeneratedImage>,
    pub batch_id: String,
    pub prompt: String,
    pub workflow: String,
}

/// POST /api/generate-image
pub async fn generate_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (request, uploaded_files) = read_multipart(&state, multipart).await?;

    // Per-request generation parameters, with the top-level fields overlaid.
    let mut params: GenerationParams = if request.params.is_null() {
        GenerationParams::default()
    } else {
        serde_json::from_value(request.params.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid params: {e}")))?
    };
    params.prompt = request.prompt.clone();
    params.batch = request.batch_size;
    params.has_reference_image = request.has_reference_image || !uploaded_files.is_empty();

    params.validate().map_err(AppError::Core)?;

    tracing::info!(
        prompt = %params.prompt,
        workflow = %request.workflow,
        batch = params.batch,
        reference_images = uploaded_files.len(),
        "Generating images"
    );

    // Optional prompt refinement.
    params.prompt = refine_prompt(&state, &params, &request.refiner).await?;

    // Template -> directives -> resolved document.
    let template = state.templates.load(&params.workflow).map_err(AppError::Core)?;
    let resolved = resolve(template, &directive_set(&params)).map_err(AppError::Core)?;

    // Submit and wait.
    let timeout = Duration::from_secs(
        params
            .timeout_secs
            .unwrap_or(state.config.generation_timeout_secs),
    );
    let outcome = state
        .runpod
        .run_sync(&JobPayload::from_workflow(resolved), timeout)
        .await?;
    let url = outcome
        .message
        .ok_or_else(|| AppError::Internal("Job succeeded but returned no result URL".to_string()))?;

    // One record per batch index; the worker generates the whole batch in a
    // single run, so every record shares the result URL.
    let batch_id = request
        .batch_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut images = Vec::with_capacity(params.batch as usize);
    for batch_index in 0..params.batch {
        let image = GeneratedImage {
            id: Uuid::new_v4(),
            url: url.clone(),
            prompt: params.prompt.clone(),
            workflow: request.workflow.clone(),
            timestamp: Utc::now(),
            params: request.params.clone(),
            global_params: request.global_params.clone(),
            refiner: request.refiner.clone(),
            refiner_params: request.refiner_params.clone(),
            used_reference_image: params.has_reference_image,
            batch_id: batch_id.clone(),
            batch_index,
        };
        tracing::info!(
            batch_index = batch_index + 1,
            batch = params.batch,
            id = %image.id,
            "Recorded generated image"
        );
        state.images.insert(image.clone()).await;
        images.push(image);
    }

    Ok(Json(GenerateResponse {
        success: true,
        images,
        batch_id,
        prompt: params.prompt.clone(),
        workflow: request.workflow,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read the multipart form: the `data` JSON field and any `image` parts.
async fn read_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> AppResult<(GenerateRequest, Vec<PathBuf>)> {
    let mut request: Option<GenerateRequest> = None;
    let mut uploaded_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart form: {e}")))?
    {
        match field.name() {
            Some("data") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable data field: {e}")))?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;
                request = Some(parsed);
            }
            Some("image") => {
                let raw_name = field.file_name().unwrap_or("").to_string();
                if raw_name.is_empty() {
                    continue;
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable image field: {e}")))?;
                let path = upload::save_upload(&state.config.upload_dir, &raw_name, &bytes).await?;
                uploaded_files.push(path);
            }
            _ => {}
        }
    }

    let request =
        request.ok_or_else(|| AppError::BadRequest("Missing data parameter".to_string()))?;
    Ok((request, uploaded_files))
}

/// Run the prompt through the refiner when requested.
///
/// Metaprompt mode rewrites first (the prompt is an instruction to write a
/// prompt), then a selected refiner polishes the result. A missing system
/// prompt file is logged and skipped rather than failing the request.
async fn refine_prompt(
    state: &AppState,
    params: &GenerationParams,
    refiner: &str,
) -> AppResult<String> {
    let mut prompt = params.prompt.clone();

    if params.metaprompt {
        if let Some(system) = load_system_prompt(state, METAPROMPT_SYSTEM_FILE) {
            prompt = state.refiner.refine(&prompt, &system).await?;
        }
    }

    // An explicit `refine` parameter names the system prompt file directly;
    // otherwise a refiner id selects `<id>.txt` from the template dirs.
    let system_file = match (&params.refine, refiner) {
        (Some(file), _) => Some(file.clone()),
        (None, "none") => None,
        (None, id) => Some(format!("{id}.txt")),
    };

    if let Some(file) = system_file {
        if let Some(system) = load_system_prompt(state, &file) {
            prompt = state.refiner.refine(&prompt, &system).await?;
        }
    }

    Ok(prompt)
}

/// Load a refiner system prompt via the template store's search paths.
fn load_system_prompt(state: &AppState, name: &str) -> Option<String> {
    let Some(path) = state.templates.find(name) else {
        tracing::warn!(file = %name, "Refiner system prompt not found; skipping refinement");
        return None;
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(file = %name, error = %e, "Refiner system prompt unreadable; skipping");
            None
        }
    }
}
