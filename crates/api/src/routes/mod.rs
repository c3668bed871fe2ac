pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree, minus generation.
///
/// Route hierarchy:
///
/// ```text
/// /images                  list stored image records (GET)
/// /images/{id}             one image record (GET)
///
/// /workflows               workflow catalog (GET)
/// /refiners                refiner catalog (GET)
/// /refiner-params/{id}     parameter schema for one refiner (GET)
/// /global-options          global generation options (GET)
///
/// /logs                    recent console entries (GET, ?limit=N)
/// /log                     append a frontend entry (POST)
///
/// /publish-image           publish an image to a destination (POST)
/// /extract-metadata        image header metadata (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Stored image records.
        .route("/images", get(handlers::images::list_images))
        .route("/images/{id}", get(handlers::images::get_image))
        // Catalogs served from the data directory.
        .route("/workflows", get(handlers::catalog::get_workflows))
        .route("/refiners", get(handlers::catalog::get_refiners))
        .route(
            "/refiner-params/{id}",
            get(handlers::catalog::get_refiner_params),
        )
        .route("/global-options", get(handlers::catalog::get_global_options))
        // Operator console.
        .route("/logs", get(handlers::logs::get_logs))
        .route("/log", post(handlers::logs::add_log))
        // Publishing and inspection.
        .route("/publish-image", post(handlers::publish::publish_image))
        .route(
            "/extract-metadata",
            post(handlers::metadata::extract_metadata),
        )
}

/// Build the generation route tree, nested under `/api` separately from
/// [`api_routes`].
///
/// These routes block on the remote job and are therefore kept outside the
/// request-timeout layer; `run_sync` enforces the job timeout instead.
///
/// ```text
/// /generate-image          run a generation job (POST, multipart)
/// ```
pub fn generation_routes() -> Router<AppState> {
    Router::new().route("/generate-image", post(handlers::generate::generate_image))
}
