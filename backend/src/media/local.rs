use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::MAX_UPLOAD_BYTES;
use crate::error::{AppError, AppResult};
use crate::media::{sanitize_file_name, MediaStore};

/// Writes uploads under a directory served at `/media`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    base_path: PathBuf,
    public_prefix: String,
}

impl LocalMediaStore {
    pub async fn new(base_path: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            )
        })?;

        info!(path = %base_path.display(), "Local media store initialized");

        Ok(Self {
            base_path,
            public_prefix: "/media".to_string(),
        })
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::validation("Uploaded file is too large"));
        }

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(name));
        let path = self.base_path.join(&file_name);
        fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Upstream(format!("writing {}: {}", path.display(), e)))?;

        debug!(size = bytes.len(), file = %file_name, "Stored media");
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("lif-media-{}", Uuid::new_v4()));
        let store = LocalMediaStore::new(dir.clone()).await.unwrap();

        let url = store.upload(b"jpeg".to_vec(), "me.jpg").await.unwrap();

        assert!(url.starts_with("/media/"));
        assert!(url.ends_with("-me.jpg"));
        let stored = dir.join(url.trim_start_matches("/media/"));
        assert_eq!(tokio::fs::read(stored).await.unwrap(), b"jpeg");

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let dir = std::env::temp_dir().join(format!("lif-media-{}", Uuid::new_v4()));
        let store = LocalMediaStore::new(dir.clone()).await.unwrap();
        assert!(matches!(
            store.upload(Vec::new(), "x.png").await,
            Err(AppError::Validation(_))
        ));
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
