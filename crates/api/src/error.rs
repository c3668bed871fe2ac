use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prompter_core::error::CoreError;
use prompter_openai::OpenAiError;
use prompter_runpod::RunPodError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain error from `prompter-core` and the provider-client
/// errors, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent `{ "error": ..., "code": ... }` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `prompter-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the RunPod job-submission client.
    #[error(transparent)]
    RunPod(#[from] RunPodError),

    /// An error from the prompt-refinement client.
    #[error(transparent)]
    OpenAi(#[from] OpenAiError),

    /// A local file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A missing resource with a human-readable message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::MalformedInput(msg) => {
                    (StatusCode::BAD_REQUEST, "MALFORMED_INPUT", msg.clone())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::TemplateNotFound(name) => (
                    StatusCode::NOT_FOUND,
                    "TEMPLATE_NOT_FOUND",
                    format!("Workflow template not found: {name}"),
                ),
                CoreError::Io(_) | CoreError::Json(_) | CoreError::Internal(_) => {
                    tracing::error!(error = %core, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Provider errors ---
            AppError::RunPod(err) => classify_runpod_error(err),
            AppError::OpenAi(err) => {
                tracing::error!(error = %err, "Prompt refinement failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "REFINER_ERROR",
                    "Prompt refinement failed".to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::Io(err) => {
                tracing::error!(error = %err, "File I/O error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a RunPod error into an HTTP status, error code, and message.
///
/// - A job timeout maps to 504.
/// - A worker-reported failure maps to 502 with the worker's message.
/// - Transport and API-level failures map to 502 with a sanitized message.
fn classify_runpod_error(err: &RunPodError) -> (StatusCode, &'static str, String) {
    match err {
        RunPodError::Timeout(secs) => (
            StatusCode::GATEWAY_TIMEOUT,
            "JOB_TIMEOUT",
            format!("Job timed out after {secs}s"),
        ),
        RunPodError::JobFailed(msg) => (
            StatusCode::BAD_GATEWAY,
            "JOB_FAILED",
            format!("Generation job failed: {msg}"),
        ),
        other => {
            tracing::error!(error = %other, "RunPod request failed");
            (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_ERROR",
                "Inference provider request failed".to_string(),
            )
        }
    }
}
