use std::sync::Arc;

use prompter_core::catalog::Catalog;
use prompter_core::templates::TemplateStore;
use prompter_openai::ChatClient;
use prompter_runpod::RunPodClient;

use crate::config::ServerConfig;
use crate::images::ImageStore;
use crate::logbuf::ConsoleBuffer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// The image store and console buffer live here rather than in globals, so
/// their retention policies are owned by the request-handling layer.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Bounded in-memory store of generated-image records.
    pub images: Arc<ImageStore>,
    /// Bounded console log ring buffer served over `/api/logs`.
    pub console: Arc<ConsoleBuffer>,
    /// Static catalog data (workflows, refiners, global options).
    pub catalog: Arc<Catalog>,
    /// Workflow template lookup.
    pub templates: TemplateStore,
    /// RunPod job-submission client.
    pub runpod: Arc<RunPodClient>,
    /// Chat-completion client for prompt refinement.
    pub refiner: Arc<ChatClient>,
    /// Plain HTTP client for image downloads (publish, metadata).
    pub http: reqwest::Client,
}
