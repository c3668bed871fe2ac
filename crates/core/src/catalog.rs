//! Static catalog data served by the API.
//!
//! Workflows, refiners, refiner parameter sets, and global options are
//! shipped as JSON array files in the data directory and loaded once at
//! startup. A missing or unreadable file is logged and yields an empty
//! list rather than failing startup; the frontend degrades gracefully.

use std::path::Path;

use serde_json::Value;

/// Catalog data loaded from the data directory.
#[derive(Debug, Default)]
pub struct Catalog {
    pub workflows: Vec<Value>,
    pub refiners: Vec<Value>,
    pub refiner_params: Vec<Value>,
    pub global_options: Vec<Value>,
}

impl Catalog {
    /// Load all catalog files from `data_dir`.
    pub fn load(data_dir: &Path) -> Self {
        Self {
            workflows: load_json_array(&data_dir.join("workflows.json")),
            refiners: load_json_array(&data_dir.join("refiners.json")),
            refiner_params: load_json_array(&data_dir.join("refiner-params.json")),
            global_options: load_json_array(&data_dir.join("global-options.json")),
        }
    }

    /// Look up the parameter set for a refiner by its `id` field.
    pub fn refiner_params_for(&self, refiner_id: &str) -> Option<&Value> {
        self.refiner_params
            .iter()
            .find(|entry| entry.get("id").and_then(Value::as_str) == Some(refiner_id))
    }
}

/// Read a JSON array file, returning an empty list on any failure.
fn load_json_array(path: &Path) -> Vec<Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Catalog file not readable");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Value>>(&text) {
        Ok(entries) => {
            tracing::info!(path = %path.display(), count = entries.len(), "Loaded catalog data");
            entries
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Catalog file is not a JSON array");
            Vec::new()
        }
    }
}
