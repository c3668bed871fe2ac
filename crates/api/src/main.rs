use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prompter_api::config::ServerConfig;
use prompter_api::images::ImageStore;
use prompter_api::logbuf::{ConsoleBuffer, ConsoleLayer};
use prompter_api::router::build_app_router;
use prompter_api::state::AppState;
use prompter_core::catalog::Catalog;
use prompter_core::templates::TemplateStore;
use prompter_openai::ChatClient;
use prompter_runpod::RunPodClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    // The console buffer doubles as a tracing layer so INFO+ events are
    // visible through GET /api/logs.
    let console = Arc::new(ConsoleBuffer::new(config.log_buffer_capacity));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,prompter_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(ConsoleLayer::new(Arc::clone(&console)))
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Working directories ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    // --- Catalogs and templates ---
    let catalog = Catalog::load(&config.data_dir);
    tracing::info!(
        workflows = catalog.workflows.len(),
        refiners = catalog.refiners.len(),
        "Loaded catalogs"
    );
    let templates = TemplateStore::new(config.template_dirs.clone());

    // --- Provider clients ---
    let mut runpod = RunPodClient::new(&config.runpod_api_key, &config.runpod_endpoint_id);
    if let Some(base) = &config.runpod_api_base {
        runpod = runpod.with_base_url(base);
    }

    let mut refiner = ChatClient::new(&config.openai_api_key);
    if let Some(base) = &config.openai_api_base {
        refiner = refiner.with_base_url(base);
    }
    if let Some(model) = &config.openai_model {
        refiner = refiner.with_model(model);
    }

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        images: Arc::new(ImageStore::new(config.image_store_capacity)),
        console,
        catalog: Arc::new(catalog),
        templates,
        runpod: Arc::new(runpod),
        refiner: Arc::new(refiner),
        http: reqwest::Client::new(),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
