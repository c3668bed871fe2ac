//! Handlers for the operator console log buffer.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::logbuf::LogEntry;
use crate::state::AppState;

/// Default number of entries returned by `GET /api/logs`.
const DEFAULT_LOG_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Maximum number of entries to return (0 = everything retained).
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// GET /api/logs?limit=N -- the most recent console entries.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    Ok(Json(LogsResponse {
        logs: state.console.recent(limit),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddLogRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "frontend".to_string()
}

#[derive(Debug, Serialize)]
pub struct AddLogResponse {
    pub status: &'static str,
    pub log: LogEntry,
}

/// POST /api/log -- append an entry from the frontend.
pub async fn add_log(
    State(state): State<AppState>,
    Json(request): Json<AddLogRequest>,
) -> AppResult<impl IntoResponse> {
    if request.message.is_empty() {
        return Err(AppError::BadRequest("No log message provided".to_string()));
    }

    let entry = state.console.push(request.source, request.message);
    Ok(Json(AddLogResponse {
        status: "success",
        log: entry,
    }))
}
