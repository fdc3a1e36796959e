// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Submission photo storage on local disk.
//!
//! Photos land under the configured upload root with generated names and
//! are served back by the router's `/uploads` static mount. The stored
//! reference on a submission is the public path, not the filesystem one.

use crate::error::AppError;
use std::path::PathBuf;

/// Public URL prefix the router serves the upload root under.
const PUBLIC_PREFIX: &str = "/uploads";

/// Disk-backed store for submission photos.
#[derive(Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    /// Open (and create if needed) the upload root.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to create upload dir {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// Persist one uploaded photo and return its public reference
    /// (e.g. `/uploads/9f6e….jpg`).
    pub async fn save(
        &self,
        content_type: Option<&str>,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let name = format!(
            "{}.{}",
            uuid::Uuid::new_v4(),
            extension_for(content_type, file_name)
        );

        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to store photo: {}", e)))?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }
}

/// Pick a file extension from the declared content type, falling back to
/// the client-supplied filename, then to `bin`.
fn extension_for(content_type: Option<&str>, file_name: Option<&str>) -> String {
    match content_type {
        Some("image/jpeg") => return "jpg".to_string(),
        Some("image/png") => return "png".to_string(),
        Some("image/gif") => return "gif".to_string(),
        Some("image/webp") => return "webp".to_string(),
        Some("image/heic") => return "heic".to_string(),
        _ => {}
    }

    file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_prefers_content_type() {
        assert_eq!(extension_for(Some("image/jpeg"), Some("x.png")), "jpg");
        assert_eq!(extension_for(Some("image/webp"), None), "webp");
    }

    #[test]
    fn test_extension_falls_back_to_filename() {
        assert_eq!(extension_for(None, Some("photo.HEIC")), "heic");
        assert_eq!(extension_for(Some("application/octet-stream"), Some("a.b.jpeg")), "jpeg");
    }

    #[test]
    fn test_extension_rejects_junk_filenames() {
        assert_eq!(extension_for(None, Some("no-extension")), "bin");
        assert_eq!(extension_for(None, Some("trailing.")), "bin");
        assert_eq!(extension_for(None, Some("weird.../../etc")), "bin");
        assert_eq!(extension_for(None, None), "bin");
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path()).unwrap();

        let reference = store
            .save(Some("image/png"), Some("donut.png"), b"not-a-real-png")
            .await
            .unwrap();

        assert!(reference.starts_with("/uploads/"));
        assert!(reference.ends_with(".png"));

        let on_disk = dir.path().join(reference.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"not-a-real-png");
    }
}
