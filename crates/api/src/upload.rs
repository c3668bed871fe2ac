//! Reference-image upload handling.
//!
//! Uploaded filenames are attacker-controlled, so they are reduced to a
//! safe basename before anything touches the filesystem.

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Reduce an uploaded filename to a safe basename.
///
/// Path components are stripped and every character outside
/// `[A-Za-z0-9._-]` is replaced with `_`. A name that sanitizes to nothing
/// (or to only dots) gets a generated fallback so the upload still lands
/// somewhere predictable.
pub fn sanitize_filename(raw: &str) -> String {
    let basename = Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cleaned: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.' || c == '_') {
        format!("upload-{}", uuid::Uuid::new_v4())
    } else {
        cleaned
    }
}

/// Write uploaded bytes into `upload_dir` under a sanitized name.
///
/// Returns the path the file was saved to.
pub async fn save_upload(upload_dir: &Path, raw_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
    let filename = sanitize_filename(raw_name);
    let path = upload_dir.join(&filename);

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save upload: {e}")))?;

    tracing::info!(file = %filename, bytes = bytes.len(), "Saved uploaded file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("/abs/path/photo.png"), "photo.png");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
    }

    #[test]
    fn safe_names_pass_through() {
        assert_eq!(sanitize_filename("ref-image_01.jpeg"), "ref-image_01.jpeg");
    }

    #[test]
    fn degenerate_names_get_a_fallback() {
        assert!(sanitize_filename("..").starts_with("upload-"));
        assert!(sanitize_filename("???").starts_with("upload-"));
        assert!(sanitize_filename("").starts_with("upload-"));
    }

    #[tokio::test]
    async fn save_writes_sanitized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(dir.path(), "../sneaky.png", b"bytes")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("sneaky.png"));
        assert_eq!(std::fs::read(path).unwrap(), b"bytes");
    }
}
