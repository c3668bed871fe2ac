use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All non-credential fields have defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Generation requests
    /// are exempt; they carry their own job timeout.
    pub request_timeout_secs: u64,
    /// Directory for uploaded reference images.
    pub upload_dir: PathBuf,
    /// Directory for published images.
    pub publish_dir: PathBuf,
    /// Directory holding catalog JSON files.
    pub data_dir: PathBuf,
    /// Directory holding the built frontend, served as static files.
    pub static_dir: PathBuf,
    /// Search roots for workflow templates and refiner system prompts.
    pub template_dirs: Vec<PathBuf>,
    /// Default job timeout in seconds when the request does not specify one.
    pub generation_timeout_secs: u64,
    /// Console log ring-buffer capacity.
    pub log_buffer_capacity: usize,
    /// In-memory image store capacity (oldest records evicted beyond this).
    pub image_store_capacity: usize,
    /// OpenAI-compatible API key for prompt refinement.
    pub openai_api_key: String,
    /// Override for the chat-completion API base URL.
    pub openai_api_base: Option<String>,
    /// Override for the chat-completion model name.
    pub openai_model: Option<String>,
    /// RunPod API key.
    pub runpod_api_key: String,
    /// RunPod serverless endpoint id.
    pub runpod_endpoint_id: String,
    /// Override for the RunPod API base URL.
    pub runpod_api_base: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `5000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `UPLOAD_DIR`              | `uploads`               |
    /// | `PUBLISH_DIR`             | `published_images`      |
    /// | `DATA_DIR`                | `src/data`              |
    /// | `STATIC_DIR`              | `build`                 |
    /// | `TEMPLATE_DIRS`           | `.`                     |
    /// | `GENERATION_TIMEOUT_SECS` | `120`                   |
    /// | `LOG_BUFFER_CAPACITY`     | `1000`                  |
    /// | `IMAGE_STORE_CAPACITY`    | `500`                   |
    ///
    /// `OPENAI_API_KEY`, `RUNPOD_API_KEY`, and `RUNPOD_ENDPOINT_ID` are
    /// required; every missing one is reported in a single panic so a
    /// misconfigured deployment fails fast with the full picture.
    /// `OPENAI_API_BASE`, `OPENAI_MODEL`, and `RUNPOD_API_BASE` are
    /// optional overrides.
    pub fn from_env() -> Self {
        let required = ["OPENAI_API_KEY", "RUNPOD_API_KEY", "RUNPOD_ENDPOINT_ID"];
        let missing: Vec<&str> = required
            .iter()
            .filter(|var| std::env::var(var).is_err())
            .copied()
            .collect();
        if !missing.is_empty() {
            panic!("Missing environment variables: {}. Fatal.", missing.join(", "));
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let template_dirs: Vec<PathBuf> = std::env::var("TEMPLATE_DIRS")
            .unwrap_or_else(|_| ".".into())
            .split(',')
            .map(|s| PathBuf::from(s.trim()))
            .filter(|p| !p.as_os_str().is_empty())
            .collect();

        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| prompter_core::params::DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("GENERATION_TIMEOUT_SECS must be a valid u64");

        let log_buffer_capacity: usize = std::env::var("LOG_BUFFER_CAPACITY")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("LOG_BUFFER_CAPACITY must be a valid usize");

        let image_store_capacity: usize = std::env::var("IMAGE_STORE_CAPACITY")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("IMAGE_STORE_CAPACITY must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            publish_dir: std::env::var("PUBLISH_DIR")
                .unwrap_or_else(|_| "published_images".into())
                .into(),
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "src/data".into())
                .into(),
            static_dir: std::env::var("STATIC_DIR")
                .unwrap_or_else(|_| "build".into())
                .into(),
            template_dirs,
            generation_timeout_secs,
            log_buffer_capacity,
            image_store_capacity,
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_api_base: std::env::var("OPENAI_API_BASE").ok(),
            openai_model: std::env::var("OPENAI_MODEL").ok(),
            runpod_api_key: std::env::var("RUNPOD_API_KEY").unwrap_or_default(),
            runpod_endpoint_id: std::env::var("RUNPOD_ENDPOINT_ID").unwrap_or_default(),
            runpod_api_base: std::env::var("RUNPOD_API_BASE").ok(),
        }
    }
}
