//! Workflow template file lookup and loading.
//!
//! Template files can be referred to by bare name; [`TemplateStore`] walks a
//! fixed set of locations under each configured root until one exists. A
//! template is loaded fresh from disk for every generation request, so edits
//! to a template file take effect without a restart.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CoreError;

/// Subdirectories searched under each root, in order.
const SEARCH_SUBDIRS: &[&str] = &["", "workflows", "src/workflows", "src/data/workflows"];

/// Ordered search-path lookup for workflow template files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    roots: Vec<PathBuf>,
}

impl TemplateStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Locate a template by name or path.
    ///
    /// An existing absolute or relative path is used as-is; otherwise each
    /// root and its workflow subdirectories are checked in order and the
    /// first hit wins.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.exists() {
            return Some(direct.to_path_buf());
        }

        for root in &self.roots {
            for subdir in SEARCH_SUBDIRS {
                let candidate = if subdir.is_empty() {
                    root.join(name)
                } else {
                    root.join(subdir).join(name)
                };
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }

        None
    }

    /// Load and parse a template document.
    ///
    /// Fails with [`CoreError::TemplateNotFound`] when no search location
    /// contains the file, or [`CoreError::Json`] when the file is not valid
    /// JSON.
    pub fn load(&self, name: &str) -> Result<Value, CoreError> {
        let path = self
            .find(name)
            .ok_or_else(|| CoreError::TemplateNotFound(name.to_string()))?;
        tracing::debug!(template = %name, path = %path.display(), "Loading workflow template");
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
