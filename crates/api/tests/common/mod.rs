use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use prompter_api::config::ServerConfig;
use prompter_api::images::ImageStore;
use prompter_api::logbuf::ConsoleBuffer;
use prompter_api::router::build_app_router;
use prompter_api::state::AppState;
use prompter_core::catalog::Catalog;
use prompter_core::templates::TemplateStore;
use prompter_openai::ChatClient;
use prompter_runpod::RunPodClient;

/// Build a test `ServerConfig` rooted in a temporary directory.
///
/// Uses `http://localhost:3000` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(root: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        upload_dir: root.path().join("uploads"),
        publish_dir: root.path().join("published"),
        data_dir: root.path().join("data"),
        static_dir: root.path().join("static"),
        template_dirs: vec![root.path().join("templates")],
        generation_timeout_secs: 5,
        log_buffer_capacity: 100,
        image_store_capacity: 100,
        openai_api_key: "test-key".to_string(),
        openai_api_base: None,
        openai_model: None,
        runpod_api_key: "test-key".to_string(),
        runpod_endpoint_id: "test-endpoint".to_string(),
        runpod_api_base: None,
    }
}

/// Build the full application router with all middleware layers, backed by
/// a temporary directory tree with small catalog fixtures.
///
/// This calls the same `build_app_router` that `main.rs` uses, so
/// integration tests exercise the production middleware stack (CORS,
/// request ID, timeout, tracing, panic recovery).
///
/// The returned `TempDir` must be kept alive for the duration of the test.
pub fn build_test_app() -> (Router, TempDir) {
    build_test_app_with(|_| {})
}

/// Like [`build_test_app`], but lets the test adjust the config first
/// (timeouts, provider base URLs pointing at local mocks, etc.).
pub fn build_test_app_with(tweak: impl FnOnce(&mut ServerConfig)) -> (Router, TempDir) {
    let root = tempfile::tempdir().expect("Failed to create temp dir");

    let data_dir = root.path().join("data");
    std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");
    std::fs::create_dir_all(root.path().join("templates")).expect("Failed to create template dir");
    std::fs::create_dir_all(root.path().join("static")).expect("Failed to create static dir");

    std::fs::write(
        data_dir.join("workflows.json"),
        r#"[{ "id": "text-to-image", "name": "Text to Image", "file": "flux1-dev-scale-l.json" }]"#,
    )
    .expect("Failed to write workflows fixture");
    std::fs::write(
        data_dir.join("refiners.json"),
        r#"[{ "id": "detail", "name": "Detail Enhancer" }]"#,
    )
    .expect("Failed to write refiners fixture");
    std::fs::write(
        data_dir.join("refiner-params.json"),
        r#"[{ "id": "detail", "params": [{ "name": "strength", "type": "number" }] }]"#,
    )
    .expect("Failed to write refiner-params fixture");
    std::fs::write(
        data_dir.join("global-options.json"),
        r#"[{ "id": "batch", "name": "Batch size" }]"#,
    )
    .expect("Failed to write global-options fixture");

    let mut config = test_config(&root);
    tweak(&mut config);

    let mut runpod = RunPodClient::new(&config.runpod_api_key, &config.runpod_endpoint_id);
    if let Some(base) = &config.runpod_api_base {
        runpod = runpod.with_base_url(base);
    }
    let mut refiner = ChatClient::new(&config.openai_api_key);
    if let Some(base) = &config.openai_api_base {
        refiner = refiner.with_base_url(base);
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        images: Arc::new(ImageStore::new(config.image_store_capacity)),
        console: Arc::new(ConsoleBuffer::new(config.log_buffer_capacity)),
        catalog: Arc::new(Catalog::load(&config.data_dir)),
        templates: TemplateStore::new(config.template_dirs.clone()),
        runpod: Arc::new(runpod),
        refiner: Arc::new(refiner),
        http: reqwest::Client::new(),
    };

    (build_app_router(state, &config), root)
}

/// Send a GET request to the router.
pub async fn get(app: Router, path: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request"),
    )
    .await
    .expect("Request failed")
}

/// Send a POST request with a JSON body to the router.
pub async fn post_json(app: Router, path: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
    )
    .await
    .expect("Request failed")
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not valid JSON")
}

/// Assert that an error response carries the expected status and code.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
}
